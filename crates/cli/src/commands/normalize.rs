use std::path::Path;
use std::process;

use staging_core::{read_snapshot_file, NormalizeOptions};

use super::print_json;
use crate::config::LoadedConfig;
use crate::{report_error, OutputFormat};

/// Rows are always printed as JSON; `--output` only affects error reporting.
pub(crate) fn cmd_normalize(
    loaded: &LoadedConfig,
    snapshot: &Path,
    files_dir: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let mut options = NormalizeOptions::new(&loaded.staging_root());
    if let Some(files_dir) = files_dir {
        options = options.with_files_dir(files_dir);
    }

    match read_snapshot_file(snapshot, &options) {
        Ok(rows) => print_json(&rows, output, quiet),
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}
