//! Kickoff Ingest - Offline corpus and index build
//!
//! Turns per-season football-data CSV exports into the two artifacts the
//! retriever loads at startup:
//! - `concat_seasons` merges season files into one CSV with a `season` column
//! - `format_match` renders each row as a line-oriented match document
//! - `IndexBuilder` embeds the documents and writes the vector index and
//!   the positionally aligned metadata file

use std::path::PathBuf;
use thiserror::Error;

pub mod builder;
pub mod documents;
pub mod seasons;

pub use builder::IndexBuilder;
pub use documents::{build_documents, format_match, load_match_documents, MatchRecord};
pub use seasons::concat_seasons;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while building the corpus
#[derive(Error, Debug)]
pub enum IngestError {
    /// The raw directory holds no season files
    #[error("No CSV files found in {0}")]
    NoInputFiles(PathBuf),

    /// IO error while reading or writing a file
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV input
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Embedding or index failure
    #[error(transparent)]
    Core(#[from] kickoff_core::KickoffError),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Create the parent directory of `path` if it has one
pub(crate) fn ensure_parent(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;
    }
    Ok(())
}
