use std::path::PathBuf;

use staging_store::StoreError;

/// Errors raised while compiling a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A compiled pipeline could not be encoded into a plan record.
    #[error("could not encode pipeline of unit '{unit_id}': {source}")]
    Encode {
        unit_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while reading a snapshot file back.
///
/// Every variant is scoped to one file; callers compiling or replaying other
/// files carry on.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("could not read snapshot '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed snapshot '{path}': {message}")]
    Shape { path: PathBuf, message: String },
}

/// Errors raised while exporting content to the snapshot tree.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not read repository dump '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid repository dump '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode snapshots for '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not copy asset '{uri}' from '{from}': {source}")]
    AssetCopy {
        uri: String,
        from: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
