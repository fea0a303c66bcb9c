//! Error types for article downloads and client cleanup.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Step of a download task that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolve,
    Fetch,
    Write,
}

/// Failure of one download task. Never escapes the task boundary; the task
/// logs it and reports only its [`Stage`].
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Random-article response had no `Location` header.
    #[error("cannot get random article: Location header not found")]
    MissingLocation,
    /// Transport failure while resolving a random article.
    #[error("cannot get random article")]
    Resolution(#[source] curl::Error),
    /// Transport failure while fetching the printable page.
    #[error("cannot get printable page of article '{title}'")]
    Fetch {
        title: String,
        #[source]
        source: curl::Error,
    },
    /// Local file write failed (missing directory, permissions, disk full).
    #[error("cannot write article '{title}' to {}", .path.display())]
    Write {
        title: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    pub fn stage(&self) -> Stage {
        match self {
            DownloadError::MissingLocation | DownloadError::Resolution(_) => Stage::Resolve,
            DownloadError::Fetch { .. } => Stage::Fetch,
            DownloadError::Write { .. } => Stage::Write,
        }
    }
}

/// Releasing the shared HTTP client failed. Logged only, never escalated.
#[derive(Debug, Error)]
#[error("cannot close HTTP client: {reason}")]
pub struct CleanupError {
    pub reason: String,
}
