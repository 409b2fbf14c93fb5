// Error taxonomy — acquisition, engine init, and per-query failures.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which phase of dataset acquisition failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStage {
    Download,
    Extract,
    Verify,
}

impl fmt::Display for AcquireStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AcquireStage::Download => "download",
            AcquireStage::Extract => "extract",
            AcquireStage::Verify => "verify",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// First-run bootstrap failed. Fatal: the process cannot serve anything
    /// without the dataset, so startup aborts and the container restart is
    /// the retry mechanism.
    #[error("dataset acquisition failed during {stage}: {message}")]
    Acquisition { stage: AcquireStage, message: String },

    /// No file at the expected dataset path. Fatal for this process.
    #[error("dataset not found at {}", path.display())]
    DataUnavailable { path: PathBuf },

    /// The dataset file exists but DuckDB could not load it. Fatal for this
    /// process.
    #[error("dataset at {} could not be loaded: {source}", path.display())]
    DataCorrupt {
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },

    /// A single query failed at the engine. Local to one request; must not
    /// take down the shared handle or unrelated cache entries.
    #[error("query failed: {0}")]
    Query(#[source] duckdb::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn acquisition(stage: AcquireStage, err: impl fmt::Display) -> Self {
        AppError::Acquisition {
            stage,
            message: err.to_string(),
        }
    }

    /// Whether this error is unrecoverable at the process level.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Acquisition { .. }
                | AppError::DataUnavailable { .. }
                | AppError::DataCorrupt { .. }
                | AppError::Config(_)
        )
    }
}
