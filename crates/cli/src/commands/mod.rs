pub(crate) mod export;
pub(crate) mod normalize;
pub(crate) mod plan;
pub(crate) mod show_config;

use std::path::Path;
use std::process;

use staging_schema::Schema;

use crate::{report_error, OutputFormat};

/// Load the schema document or exit with status 1.
pub(crate) fn load_schema_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> Schema {
    match staging_schema::load_schema(path) {
        Ok(schema) => schema,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Pretty-print a JSON value on stdout.
pub(crate) fn print_json(value: &impl serde::Serialize, output: OutputFormat, quiet: bool) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{}", pretty),
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}
