//! Crate-wide error type. Stage runners log these and keep going.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model checksum mismatch for {}", .0.display())]
    ChecksumMismatch(PathBuf),

    #[error("incompatible model: {0}")]
    IncompatibleModel(String),

    #[error("need at least {needed} labelled rows, got {rows}")]
    InsufficientData { rows: usize, needed: usize },

    #[error("feature table is empty")]
    EmptyFeatureTable,
}

impl Error {
    /// Map an open/read failure, turning `NotFound` into [`Error::MissingInput`].
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::MissingInput(path)
        } else {
            Error::Io { path, source }
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
