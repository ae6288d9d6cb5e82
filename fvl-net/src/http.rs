use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use fvl_common::error::{FvlError, Result};
use fvl_common::fetch::ArchiveFetcher;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, error, info, warn};

use crate::validation::{file_name_from_url, validate_url};

const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = concat!("fvl view launcher/", env!("CARGO_PKG_VERSION"));

/// Fetches release archives over HTTPS. One attempt per call; failures are
/// reported to the caller rather than retried.
///
/// The blocking client is built on first use, so a fetcher can be created on
/// an async runtime thread as long as `fetch` runs off it.
#[derive(Default)]
pub struct HttpFetcher {
    client: OnceLock<Client>,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a progress bar on stderr while downloading.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        validate_url(url)?;
        let client = match self.client.get() {
            Some(client) => client,
            None => {
                let built = build_http_client()?;
                self.client.get_or_init(|| built)
            }
        };
        info!("Downloading {} to {}", url, dest.display());
        download_to(client, url, dest, self.show_progress)
    }
}

fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| FvlError::HttpError(format!("Failed to build HTTP client: {e}")))
}

fn partial_path_for(final_path: &Path) -> PathBuf {
    let temp_filename = format!(
        ".{}.download",
        final_path.file_name().unwrap_or_default().to_string_lossy()
    );
    final_path.with_file_name(temp_filename)
}

fn download_to(client: &Client, url: &str, final_path: &Path, show_progress: bool) -> Result<()> {
    let display_name = final_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .or_else(|| file_name_from_url(url))
        .unwrap_or_default();

    if let Some(parent) = final_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = partial_path_for(final_path);
    debug!("Downloading to temporary path: {}", temp_path.display());
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    let response = client.get(url).send().map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        FvlError::HttpError(format!("HTTP request failed for {url}: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        error!("HTTP error {} for URL {}", status, url);
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            other => format!("HTTP status {other}"),
        };
        return Err(FvlError::DownloadError(
            display_name,
            url.to_string(),
            reason,
        ));
    }

    let progress = if show_progress {
        match response.content_length() {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{msg} [{bar:30}] {bytes}/{total_bytes} ({eta})",
                ) {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar.set_message(format!("Downloading {display_name}"));
                bar
            }
            None => ProgressBar::new_spinner(),
        }
    } else {
        ProgressBar::hidden()
    };

    let write_result = (|| -> io::Result<u64> {
        let mut temp_file = File::create(&temp_path)?;
        let mut reader = progress.wrap_read(response);
        let written = io::copy(&mut reader, &mut temp_file)?;
        temp_file.sync_all()?;
        Ok(written)
    })();
    progress.finish_and_clear();

    let written = match write_result {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(FvlError::DownloadError(
                display_name,
                url.to_string(),
                format!("Failed to write download stream: {e}"),
            ));
        }
    };
    debug!("Finished writing {} bytes to temp file.", written);

    fs::rename(&temp_path, final_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        FvlError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!(
                "Failed to move temp file {} to {}: {}",
                temp_path.display(),
                final_path.display(),
                e
            ),
        )))
    })?;
    debug!("Moved download to final location: {}", final_path.display());
    Ok(())
}
