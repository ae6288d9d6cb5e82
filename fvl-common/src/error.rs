use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum FvlError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("No {platform} view bundle found (searched: {})", display_paths(.searched))]
    BundleNotFound {
        platform: String,
        searched: Vec<PathBuf>,
    },

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("HttpError: {0}")]
    HttpError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Failed to extract {}: {reason}", .archive.display())]
    ArchiveExtraction { archive: PathBuf, reason: String },

    #[error("Unsafe entry '{entry}' in archive {}", .archive.display())]
    UnsafeArchiveEntry { archive: PathBuf, entry: String },

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<std::io::Error> for FvlError {
    fn from(err: std::io::Error) -> Self {
        FvlError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for FvlError {
    fn from(err: reqwest::Error) -> Self {
        FvlError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for FvlError {
    fn from(err: serde_json::Error) -> Self {
        FvlError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FvlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_not_found_lists_every_searched_dir() {
        let err = FvlError::BundleNotFound {
            platform: "linux-amd64".to_string(),
            searched: vec![PathBuf::from("/a/build/linux"), PathBuf::from("/b/cache")],
        };
        assert_eq!(
            err.to_string(),
            "No linux-amd64 view bundle found (searched: /a/build/linux, /b/cache)"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: FvlError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, FvlError::Io(_)));
    }
}
