//! Loading `staging.toml`.

use std::path::{Path, PathBuf};

use staging_schema::StagingConfig;

/// Config file looked up in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "staging.toml";

/// A configuration together with where it was read from.
#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    pub config: StagingConfig,
    /// `None` when no file was found and defaults are in effect.
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// The staging root. A relative `directory` resolves against the config
    /// file's directory.
    pub fn staging_root(&self) -> PathBuf {
        let directory = &self.config.staging.directory;
        match self.source.as_deref().and_then(Path::parent) {
            Some(base) if directory.is_relative() => base.join(directory),
            _ => directory.clone(),
        }
    }
}

/// Read the given file, or `staging.toml` if present, or fall back to
/// defaults. An explicitly named file must exist.
pub(crate) fn load(path: Option<&Path>) -> Result<LoadedConfig, String> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                return Ok(LoadedConfig {
                    config: StagingConfig::default(),
                    source: None,
                });
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
    let config = parse(&content)
        .map_err(|e| format!("error parsing config '{}': {}", path.display(), e))?;
    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}

pub(crate) fn parse(content: &str) -> Result<StagingConfig, toml::de::Error> {
    toml::from_str(content)
}
