//! Error handling for acfun-dl

use crate::http::TransportError;
use thiserror::Error;

/// Main error type for acfun-dl
#[derive(Debug, Error)]
pub enum AcfunError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Failed to fetch {url} after {attempts} attempt(s): {cause}")]
    Fetch {
        url: String,
        attempts: usize,
        cause: TransportError,
    },

    #[error("Failed to parse page for {id}: {reason}")]
    Parse { id: String, reason: String },

    #[error("No stream at {requested} or lower for part {part}")]
    NoStream { part: u32, requested: String },

    #[error("Download of part {part} failed: {reason}")]
    Download { part: u32, reason: String },

    #[error("Merging part {part} failed: {reason}")]
    Merge { part: u32, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcfunError {
    pub(crate) fn parse(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AcfunError::Parse {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the failure class, used in batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            AcfunError::InvalidId(_) => "invalid-id",
            AcfunError::Fetch { .. } => "fetch",
            AcfunError::Parse { .. } => "parse",
            AcfunError::NoStream { .. } => "no-stream",
            AcfunError::Download { .. } => "download",
            AcfunError::Merge { .. } => "merge",
            AcfunError::Io(_) => "io",
        }
    }
}

pub type Result<T, E = AcfunError> = std::result::Result<T, E>;
