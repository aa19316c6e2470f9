use std::path::Path;
use std::process;

use staging_core::{Exporter, JsonRepository};
use staging_schema::StagingScope;

use super::{load_schema_or_exit, print_json};
use crate::config::LoadedConfig;
use crate::{report_error, OutputFormat};

pub(crate) struct ExportArgs<'a> {
    pub schema: &'a Path,
    pub repository: &'a Path,
    pub bundle: Option<&'a str>,
    pub files_root: Option<&'a Path>,
}

pub(crate) fn cmd_export(
    loaded: &LoadedConfig,
    args: ExportArgs<'_>,
    output: OutputFormat,
    quiet: bool,
) {
    let schema = load_schema_or_exit(args.schema, output, quiet);

    let mut repository = match JsonRepository::load(args.repository) {
        Ok(repository) => repository,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    if let Some(files_root) = args.files_root {
        repository = repository.with_files_root(files_root);
    }

    let staging_root = loaded.staging_root();
    let scope = StagingScope::new(&schema, &loaded.config);
    let exporter = Exporter::new(scope, &repository, &staging_root);
    let report = match exporter.export_all(args.bundle) {
        Ok(report) => report,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => print_json(&report, output, quiet),
        OutputFormat::Text => {
            if !quiet {
                for file in &report.files {
                    println!(
                        "exported {} {} {} ({} items)",
                        file.entity_type, file.language, file.bundle, file.items
                    );
                }
                println!(
                    "{} files, {} items written to {}",
                    report.files.len(),
                    report.items(),
                    staging_root.display()
                );
            }
        }
    }
}
