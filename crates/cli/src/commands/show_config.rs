use std::path::PathBuf;
use std::process;

use serde::Serialize;
use staging_schema::StagingConfig;

use crate::config::LoadedConfig;
use crate::{report_error, OutputFormat};

#[derive(Serialize)]
struct ConfigView<'a> {
    source: Option<&'a PathBuf>,
    staging_root: PathBuf,
    config: &'a StagingConfig,
}

pub(crate) fn cmd_show_config(loaded: &LoadedConfig, output: OutputFormat) {
    let rendered = match output {
        OutputFormat::Json => serde_json::to_string_pretty(&ConfigView {
            source: loaded.source.as_ref(),
            staging_root: loaded.staging_root(),
            config: &loaded.config,
        })
        .map_err(|e| e.to_string()),
        OutputFormat::Text => toml::to_string_pretty(&loaded.config).map_err(|e| e.to_string()),
    };
    match rendered {
        Ok(text) => {
            if output == OutputFormat::Text {
                match &loaded.source {
                    Some(path) => println!("# {}", path.display()),
                    None => println!("# defaults (no config file)"),
                }
            }
            println!("{}", text);
        }
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, false);
            process::exit(1);
        }
    }
}
