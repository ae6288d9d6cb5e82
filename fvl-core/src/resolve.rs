// fvl-core/src/resolve.rs
//! Locates a runnable view bundle for one platform and version.
//!
//! Steps run in a fixed order and stop at the first directory that yields a
//! match: the local build output, the `<PRODUCT>_VIEW_PATH` override, the
//! bundled directory and finally the version cache, which is populated on
//! demand. Only the last step can touch the network.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fvl_aio::fs::{find_by_extension, find_owner_executables, EntryKind};
use fvl_common::config::Config;
use fvl_common::error::{FvlError, Result};
use fvl_common::fetch::ArchiveFetcher;
use fvl_common::platform::{BundleKind, PlatformTarget};
use tracing::{debug, info};

use crate::install::{ensure_installed, InstallOutcome};

/// Which search step produced a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleSource {
    LocalBuild,
    EnvOverride,
    BundledDir,
    /// Version cache that was already populated.
    Cache,
    /// Version cache populated during this resolve.
    Installed,
}

impl fmt::Display for BundleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleSource::LocalBuild => write!(f, "local build"),
            BundleSource::EnvOverride => write!(f, "environment override"),
            BundleSource::BundledDir => write!(f, "bundled directory"),
            BundleSource::Cache => write!(f, "cache"),
            BundleSource::Installed => write!(f, "fresh install"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
    pub path: PathBuf,
    pub source: BundleSource,
}

pub struct Resolver {
    config: Config,
    platform: PlatformTarget,
    fetcher: Arc<dyn ArchiveFetcher>,
}

impl Resolver {
    pub fn new(config: Config, platform: PlatformTarget, fetcher: Arc<dyn ArchiveFetcher>) -> Self {
        Self {
            config,
            platform,
            fetcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform(&self) -> &PlatformTarget {
        &self.platform
    }

    pub fn resolve(&self) -> Result<ResolvedBundle> {
        let mut searched = Vec::new();

        let local = self.config.local_build_dir(&self.platform);
        info!("Try loading view from {}", local.display());
        if let Some(found) = self.probe(&local, BundleSource::LocalBuild, &mut searched)? {
            return Ok(found);
        }

        if let Some(dir) = &self.config.view_path_override {
            info!(
                "Check if view can be found at ${} path",
                self.config.view_path_env_var()
            );
            if let Some(found) = self.probe(dir, BundleSource::EnvOverride, &mut searched)? {
                return Ok(found);
            }
        }

        if let Some(bundled) = &self.config.bundled_dir {
            let dir = self.with_bundle_subdir(bundled);
            info!("Check if view exists in bundled directory {}", dir.display());
            if let Some(found) = self.probe(&dir, BundleSource::BundledDir, &mut searched)? {
                return Ok(found);
            }
        }

        let cache_dir = self.config.version_cache_dir();
        info!("Check if view can be found at {}", cache_dir.display());
        let source = match ensure_installed(&self.config, &self.platform, self.fetcher.as_ref())? {
            InstallOutcome::AlreadyPresent => BundleSource::Cache,
            InstallOutcome::FromBundledArchive | InstallOutcome::Downloaded => {
                BundleSource::Installed
            }
        };
        let dir = self.with_bundle_subdir(&cache_dir);
        if let Some(found) = self.probe(&dir, source, &mut searched)? {
            return Ok(found);
        }

        Err(FvlError::BundleNotFound {
            platform: self.platform.to_string(),
            searched,
        })
    }

    /// Matches in `dir` for this platform's bundle kind, sorted by path.
    pub fn find_bundles(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        match self.platform.bundle_kind() {
            BundleKind::WindowsExecutable => find_by_extension(dir, "exe", EntryKind::File),
            BundleKind::AppBundle => find_by_extension(dir, "app", EntryKind::Dir),
            BundleKind::UnixExecutable => find_owner_executables(dir),
        }
    }

    fn with_bundle_subdir(&self, dir: &Path) -> PathBuf {
        match self.platform.bundle_subdir(&self.config.product) {
            Some(sub) => dir.join(sub),
            None => dir.to_path_buf(),
        }
    }

    fn probe(
        &self,
        dir: &Path,
        source: BundleSource,
        searched: &mut Vec<PathBuf>,
    ) -> Result<Option<ResolvedBundle>> {
        searched.push(dir.to_path_buf());
        let found = self.find_bundles(dir)?;
        debug!("{} candidate(s) in {}", found.len(), dir.display());
        Ok(found.into_iter().next().map(|path| {
            info!("View found at {} ({})", path.display(), source);
            ResolvedBundle { path, source }
        }))
    }
}
