//! Crate-wide error type

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the data source, the queries and the page renders.
///
/// Empty results and unknown filter keys are not errors: they produce
/// empty summaries.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The backing store cannot be opened or is not a readable database.
    #[error("data source unavailable at {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A required table or column is absent or has an unusable type.
    #[error("schema mismatch: {entity}")]
    SchemaMismatch { entity: String },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn schema(entity: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            entity: entity.into(),
        }
    }

    pub fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;
