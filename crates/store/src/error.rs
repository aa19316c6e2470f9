use std::path::PathBuf;

/// All errors that can be returned by a PlanStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure while reading, writing or deleting a record.
    #[error("plan store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded.
    #[error("could not serialize plan record '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored record exists but is not a valid plan record.
    #[error("corrupt plan record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
