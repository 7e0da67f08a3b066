use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum VoidError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("Extraction Error: {0}")]
    ExtractionError(String),

    #[error("Expected binary for '{app}' not found at {}. Found files: {found:?}", expected.display())]
    BinaryNotFound {
        app: String,
        expected: PathBuf,
        found: Vec<String>,
    },

    #[error("Link Error at {}: {reason}", path.display())]
    LinkError { path: PathBuf, reason: String },

    #[error("Desktop Entry Error: {0}")]
    DesktopEntryError(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("'{0}' is not installed")]
    NotInstalled(String),

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for VoidError {
    fn from(err: std::io::Error) -> Self {
        VoidError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for VoidError {
    fn from(err: reqwest::Error) -> Self {
        VoidError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for VoidError {
    fn from(err: serde_json::Error) -> Self {
        VoidError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, VoidError>;
