// fvl-core/src/install.rs
//! Populates the version-scoped cache directory from a release archive.
//!
//! The archive is unpacked into a hidden staging directory next to the cache
//! directory and renamed into place only after extraction succeeded, so the
//! cache directory never exists in a half-written state. An existing cache
//! directory is trusted as-is unless the config asks for receipts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fvl_aio::extract::extract_archive;
use fvl_aio::fs::{remove_dir_all_if_exists, remove_file_if_exists};
use fvl_common::config::Config;
use fvl_common::error::{FvlError, Result};
use fvl_common::fetch::ArchiveFetcher;
use fvl_common::platform::PlatformTarget;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const RECEIPT_FILENAME: &str = ".fvl-install.json";

/// Written inside a cache directory after a successful unpack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub product: String,
    pub version: String,
    pub archive: String,
    /// RFC 3339 timestamp.
    pub installed_at: String,
}

impl InstallReceipt {
    pub fn read(cache_dir: &Path) -> Option<Self> {
        let raw = fs::read_to_string(cache_dir.join(RECEIPT_FILENAME)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                warn!(
                    "Ignoring unreadable install receipt in {}: {}",
                    cache_dir.display(),
                    e
                );
                None
            }
        }
    }

    fn write(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(RECEIPT_FILENAME), json)?;
        Ok(())
    }
}

/// How the cache directory came to be ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyPresent,
    /// Unpacked from an archive shipped in the bundled directory.
    FromBundledArchive,
    Downloaded,
}

enum ArchiveSource {
    Bundled(PathBuf),
    Downloaded(PathBuf),
}

impl ArchiveSource {
    fn path(&self) -> &Path {
        match self {
            ArchiveSource::Bundled(p) | ArchiveSource::Downloaded(p) => p,
        }
    }
}

/// Makes sure `config.version_cache_dir()` holds an unpacked bundle, fetching
/// the release archive at most once.
pub fn ensure_installed(
    config: &Config,
    platform: &PlatformTarget,
    fetcher: &dyn ArchiveFetcher,
) -> Result<InstallOutcome> {
    let cache_dir = config.version_cache_dir();

    if cache_dir.exists() {
        if !config.require_install_receipt || InstallReceipt::read(&cache_dir).is_some() {
            debug!("Cache directory {} already present", cache_dir.display());
            return Ok(InstallOutcome::AlreadyPresent);
        }
        warn!(
            "Cache directory {} has no install receipt, reinstalling",
            cache_dir.display()
        );
        remove_dir_all_if_exists(&cache_dir)?;
    }

    let archive_name = platform.archive_name(&config.product);
    let source = locate_or_fetch_archive(config, &archive_name, fetcher)?;

    info!(
        "Extracting {} from archive to {}",
        archive_name,
        cache_dir.display()
    );
    let parent = cache_dir.parent().ok_or_else(|| {
        FvlError::Config(format!(
            "Cache directory {} has no parent",
            cache_dir.display()
        ))
    })?;
    fs::create_dir_all(parent)?;
    let staging = staging_dir_for(&cache_dir);

    let unpacked = extract_archive(source.path(), &staging, platform.archive_format()).and_then(|_| {
        InstallReceipt {
            product: config.product.clone(),
            version: config.version.to_string(),
            archive: archive_name.clone(),
            installed_at: humantime::format_rfc3339_seconds(SystemTime::now()).to_string(),
        }
        .write(&staging)
    });
    if let Err(e) = unpacked {
        if let Err(cleanup) = remove_dir_all_if_exists(&staging) {
            warn!(
                "Failed to remove staging directory {}: {}",
                staging.display(),
                cleanup
            );
        }
        discard_download(&source);
        return Err(e);
    }

    promote_staging(&staging, &cache_dir)?;
    discard_download(&source);

    Ok(match source {
        ArchiveSource::Bundled(_) => InstallOutcome::FromBundledArchive,
        ArchiveSource::Downloaded(_) => InstallOutcome::Downloaded,
    })
}

fn locate_or_fetch_archive(
    config: &Config,
    archive_name: &str,
    fetcher: &dyn ArchiveFetcher,
) -> Result<ArchiveSource> {
    if let Some(bundled_dir) = &config.bundled_dir {
        let bundled = bundled_dir.join(archive_name);
        info!("Looking for view archive at: {}", bundled.display());
        if bundled.is_file() {
            return Ok(ArchiveSource::Bundled(bundled));
        }
    }

    let url = config.release_asset_url(archive_name);
    // Per-call name: a concurrent installer discards its own download.
    let dest = config
        .temp_dir
        .join(format!("{archive_name}.{}", random_suffix()));
    info!(
        "Downloading view v{} from {} to {}",
        config.version,
        url,
        dest.display()
    );
    fetcher.fetch(&url, &dest)?;
    Ok(ArchiveSource::Downloaded(dest))
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

fn staging_dir_for(cache_dir: &Path) -> PathBuf {
    let suffix = random_suffix();
    let name = cache_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    cache_dir.with_file_name(format!(".{name}.partial-{suffix}"))
}

/// Renames the staging directory into place. Another installer finishing
/// first is fine: both unpacked the same archive.
fn promote_staging(staging: &Path, cache_dir: &Path) -> Result<()> {
    match fs::rename(staging, cache_dir) {
        Ok(()) => {
            debug!("Installed {}", cache_dir.display());
            Ok(())
        }
        Err(e) if cache_dir.exists() => {
            debug!(
                "Cache directory {} appeared concurrently ({}), discarding staging copy",
                cache_dir.display(),
                e
            );
            remove_dir_all_if_exists(staging)?;
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = remove_dir_all_if_exists(staging) {
                warn!(
                    "Failed to remove staging directory {}: {}",
                    staging.display(),
                    cleanup
                );
            }
            Err(FvlError::Io(std::sync::Arc::new(io::Error::new(
                e.kind(),
                format!(
                    "Failed to move {} to {}: {}",
                    staging.display(),
                    cache_dir.display(),
                    e
                ),
            ))))
        }
    }
}

fn discard_download(source: &ArchiveSource) {
    if let ArchiveSource::Downloaded(path) = source {
        if let Err(e) = remove_file_if_exists(path) {
            warn!("Could not remove downloaded archive {}: {}", path.display(), e);
        }
    }
}
