// fvl-net/src/validation.rs
use fvl_common::error::{FvlError, Result};
use url::Url;

/// Validates a URL, ensuring it uses the HTTPS scheme.
pub fn validate_url(url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)
        .map_err(|e| FvlError::ValidationError(format!("Failed to parse URL '{url_str}': {e}")))?;
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(FvlError::ValidationError(format!(
            "Invalid URL scheme for '{}': Must be https, but got '{}'",
            url_str,
            url.scheme()
        )))
    }
}

/// Last path segment of a URL, used to name the download on disk.
pub fn file_name_from_url(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()?
        .path_segments()?
        .next_back()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
