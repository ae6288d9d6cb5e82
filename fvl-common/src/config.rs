// fvl-common/src/config.rs
use std::env;
use std::path::PathBuf;

use tracing::debug;

use super::error::{FvlError, Result};
use crate::platform::PlatformTarget;
use crate::version::{VersionProvider, VersionTag};

pub const DEFAULT_PRODUCT: &str = "flet";
/// Version used when no provider yields one.
pub const DEFAULT_VIEW_VERSION: &str = "0.25.2";
const DEFAULT_RELEASES_BASE_URL: &str = "https://github.com/flet-dev";
const LOCAL_BUILD_DIR: &str = "build";

#[derive(Debug, Clone)]
pub struct Config {
    pub product: String,
    pub version: VersionTag,
    pub releases_base_url: String,
    /// `<cwd>/build`, searched before anything else.
    pub build_root: PathBuf,
    pub view_path_override: Option<PathBuf>,
    /// Directory shipped next to the embedding application holding either an
    /// unpacked bundle or the release archive.
    pub bundled_dir: Option<PathBuf>,
    pub home_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// Treat a cache directory as complete only if it carries an install receipt.
    pub require_install_receipt: bool,
}

impl Config {
    pub fn load(version_provider: &dyn VersionProvider) -> Result<Self> {
        debug!("Loading fvl configuration");

        let product = DEFAULT_PRODUCT.to_string();
        let version = version_provider.resolve_version()?;
        debug!("View version resolved to {}", version);

        let releases_base_url = non_empty_var("FVL_RELEASES_URL")
            .unwrap_or_else(|| DEFAULT_RELEASES_BASE_URL.to_string());

        let build_root = env::current_dir()
            .map_err(|e| FvlError::Config(format!("Cannot determine working directory: {e}")))?
            .join(LOCAL_BUILD_DIR);

        let home_dir = dirs::home_dir()
            .ok_or_else(|| FvlError::Config("Cannot determine home directory".to_string()))?;

        let view_path_override = non_empty_var(&view_path_var_for(&product)).map(PathBuf::from);
        let bundled_dir = non_empty_var("FVL_BUNDLED_DIR").map(PathBuf::from);
        let require_install_receipt = env::var("FVL_STRICT_CACHE").is_ok_and(|v| v == "1");

        debug!("Configuration loaded successfully.");
        Ok(Self {
            product,
            version,
            releases_base_url,
            build_root,
            view_path_override,
            bundled_dir,
            home_dir,
            temp_dir: env::temp_dir(),
            require_install_receipt,
        })
    }

    /// `<home>/.<product>`
    pub fn product_home(&self) -> PathBuf {
        self.home_dir.join(format!(".{}", self.product))
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.product_home().join("bin")
    }

    /// `<home>/.<product>/bin/<product>-<version>`
    pub fn version_cache_dir(&self) -> PathBuf {
        self.bin_dir()
            .join(format!("{}-{}", self.product, self.version))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.product_home().join("logs")
    }

    pub fn local_build_dir(&self, platform: &PlatformTarget) -> PathBuf {
        self.build_root.join(platform.build_dir_name())
    }

    pub fn release_asset_url(&self, archive_name: &str) -> String {
        format!(
            "{}/{}/releases/download/v{}/{}",
            self.releases_base_url.trim_end_matches('/'),
            self.product,
            self.version,
            archive_name
        )
    }

    pub fn view_path_env_var(&self) -> String {
        view_path_var_for(&self.product)
    }

    /// Read by the spawned view itself, never by the launcher.
    pub fn hide_window_env_var(&self) -> String {
        format!("{}_HIDE_WINDOW_ON_START", self.product.to_uppercase())
    }
}

fn view_path_var_for(product: &str) -> String {
    format!("{}_VIEW_PATH", product.to_uppercase())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::LinuxArch;

    fn sample() -> Config {
        Config {
            product: "flet".to_string(),
            version: VersionTag::parse("0.25.2").unwrap(),
            releases_base_url: "https://github.com/flet-dev/".to_string(),
            build_root: PathBuf::from("/work/build"),
            view_path_override: None,
            bundled_dir: None,
            home_dir: PathBuf::from("/home/me"),
            temp_dir: PathBuf::from("/tmp"),
            require_install_receipt: false,
        }
    }

    #[test]
    fn cache_dir_is_version_scoped() {
        assert_eq!(
            sample().version_cache_dir(),
            PathBuf::from("/home/me/.flet/bin/flet-0.25.2")
        );
    }

    #[test]
    fn release_url_layout() {
        assert_eq!(
            sample().release_asset_url("flet-linux-amd64.tar.gz"),
            "https://github.com/flet-dev/flet/releases/download/v0.25.2/flet-linux-amd64.tar.gz"
        );
    }

    #[test]
    fn local_build_dir_per_platform() {
        let config = sample();
        assert_eq!(
            config.local_build_dir(&PlatformTarget::Linux(LinuxArch::Amd64)),
            PathBuf::from("/work/build/linux")
        );
        assert_eq!(
            config.local_build_dir(&PlatformTarget::MacOs),
            PathBuf::from("/work/build/macos")
        );
    }

    #[test]
    fn env_var_names_derive_from_product() {
        let config = sample();
        assert_eq!(config.view_path_env_var(), "FLET_VIEW_PATH");
        assert_eq!(config.hide_window_env_var(), "FLET_HIDE_WINDOW_ON_START");
    }
}
