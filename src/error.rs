// src/error.rs
use crate::config::Symbology;
use codesheet_executor::ExecutorError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop an export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The configured geometry leaves no room for a single symbol. Raised before any file is touched.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Rendering failed for item(s) {indices:?}: {reason}")]
    WorkerFailure { indices: Vec<usize>, reason: String },

    #[error("Failed to write '{}': {source}", .path.display())]
    Stream {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Invalid export options: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
}

impl ExportError {
    /// Cancellation is a normal outcome, not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExportError::Cancelled)
    }

    pub(crate) fn stream(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Stream { path: path.into(), source }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Config(e.to_string())
    }
}

/// A single symbol could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("'{text}' is not valid {symbology} data: {reason}")]
    Rejected {
        text: String,
        symbology: Symbology,
        reason: String,
    },

    #[error("'{text}' does not fit in a QR code: {reason}")]
    Qr { text: String, reason: String },

    #[error("symbol size {width}x{height} is empty")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Png(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancelled_reports_cancelled() {
        assert!(ExportError::Cancelled.is_cancelled());
        assert!(!ExportError::InvalidLayout("no slots".into()).is_cancelled());
    }

    #[test]
    fn worker_failure_names_indices() {
        let err = ExportError::WorkerFailure { indices: vec![7], reason: "bad check digit".into() };
        assert_eq!(err.to_string(), "Rendering failed for item(s) [7]: bad check digit");
    }
}
