use std::path::Path;
use std::process;

use serde::Serialize;
use staging_core::{PlanReport, Planner};
use staging_schema::StagingScope;
use staging_store::{DirectoryPlanStore, PlanRecord, PlanStore};

use super::{load_schema_or_exit, print_json};
use crate::config::LoadedConfig;
use crate::{report_error, OutputFormat};

#[derive(Serialize)]
struct PlanOutput<'a> {
    report: &'a PlanReport,
    units: Vec<PlanRecord>,
}

pub(crate) fn cmd_plan(
    loaded: &LoadedConfig,
    schema_path: &Path,
    plan_dir: &Path,
    output: OutputFormat,
    quiet: bool,
) {
    let schema = load_schema_or_exit(schema_path, output, quiet);
    let scope = StagingScope::new(&schema, &loaded.config);
    let planner = Planner::new(scope, loaded.staging_root());
    let mut store = DirectoryPlanStore::new(plan_dir);

    let report = match planner.compile_plan(&mut store) {
        Ok(report) => report,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let records = match store.load_namespace(&loaded.config.staging.namespace) {
                Ok(records) => records,
                Err(e) => {
                    report_error(&format!("error: {}", e), output, quiet);
                    process::exit(1);
                }
            };
            print_json(
                &PlanOutput {
                    report: &report,
                    units: records,
                },
                output,
                quiet,
            );
        }
        OutputFormat::Text => {
            if !quiet {
                for id in &report.units {
                    println!("compiled {}", id);
                }
                for failed in &report.failed {
                    println!("failed {} ({})", failed.unit_id, failed.error);
                }
                println!(
                    "{} units compiled, {} skipped, {} failed, {} discarded",
                    report.units.len(),
                    report.missing.len(),
                    report.failed.len(),
                    report.discarded
                );
            }
        }
    }
}
