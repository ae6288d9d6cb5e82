// fvl-common/src/platform.rs
//! Host platform model. Every platform-specific decision (where a bundle
//! lives, what it looks like, how it is packaged upstream) hangs off
//! [`PlatformTarget`] so callers dispatch once instead of re-checking the OS.

use std::fmt;

use crate::error::{FvlError, Result};

/// CPU architecture tag used in Linux archive names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinuxArch {
    Amd64,
    Arm64,
    Arm7,
    Other(String),
}

impl LinuxArch {
    /// Maps a Rust `std::env::consts::ARCH` value to the release naming scheme.
    pub fn from_host_arch(arch: &str) -> Self {
        match arch.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => LinuxArch::Amd64,
            "aarch64" | "arm64" => LinuxArch::Arm64,
            a if a.starts_with("arm") => LinuxArch::Arm7,
            other => LinuxArch::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinuxArch::Amd64 => "amd64",
            LinuxArch::Arm64 => "arm64",
            LinuxArch::Arm7 => "arm_7",
            LinuxArch::Other(s) => s,
        }
    }
}

/// Shape of the runnable bundle on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// A `*.exe` file.
    WindowsExecutable,
    /// A `*.app` directory launched through `open`.
    AppBundle,
    /// Any regular file with the owner-execute bit set.
    UnixExecutable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformTarget {
    Windows,
    MacOs,
    Linux(LinuxArch),
}

impl PlatformTarget {
    pub fn current() -> Result<Self> {
        match std::env::consts::OS {
            "windows" => Ok(PlatformTarget::Windows),
            "macos" => Ok(PlatformTarget::MacOs),
            "linux" => Ok(PlatformTarget::Linux(LinuxArch::from_host_arch(
                std::env::consts::ARCH,
            ))),
            other => Err(FvlError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Directory name under the local `build/` output folder.
    pub fn build_dir_name(&self) -> &'static str {
        match self {
            PlatformTarget::Windows => "windows",
            PlatformTarget::MacOs => "macos",
            PlatformTarget::Linux(_) => "linux",
        }
    }

    pub fn bundle_kind(&self) -> BundleKind {
        match self {
            PlatformTarget::Windows => BundleKind::WindowsExecutable,
            PlatformTarget::MacOs => BundleKind::AppBundle,
            PlatformTarget::Linux(_) => BundleKind::UnixExecutable,
        }
    }

    pub fn archive_format(&self) -> ArchiveFormat {
        match self {
            PlatformTarget::Windows => ArchiveFormat::Zip,
            PlatformTarget::MacOs | PlatformTarget::Linux(_) => ArchiveFormat::TarGz,
        }
    }

    /// Release asset file name, e.g. `flet-linux-amd64.tar.gz`.
    pub fn archive_name(&self, product: &str) -> String {
        match self {
            PlatformTarget::Windows => format!("{product}-windows.zip"),
            PlatformTarget::MacOs => format!("{product}-macos.tar.gz"),
            PlatformTarget::Linux(arch) => format!("{product}-linux-{}.tar.gz", arch.as_str()),
        }
    }

    /// Sub-directory of an unpacked archive that holds the bundle. The macOS
    /// archive carries the `.app` at its root.
    pub fn bundle_subdir(&self, product: &str) -> Option<String> {
        match self {
            PlatformTarget::MacOs => None,
            PlatformTarget::Windows | PlatformTarget::Linux(_) => Some(product.to_string()),
        }
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformTarget::Windows => write!(f, "windows"),
            PlatformTarget::MacOs => write!(f, "macos"),
            PlatformTarget::Linux(arch) => write!(f, "linux-{}", arch.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_names_follow_release_layout() {
        assert_eq!(PlatformTarget::Windows.archive_name("flet"), "flet-windows.zip");
        assert_eq!(PlatformTarget::MacOs.archive_name("flet"), "flet-macos.tar.gz");
        assert_eq!(
            PlatformTarget::Linux(LinuxArch::Arm64).archive_name("flet"),
            "flet-linux-arm64.tar.gz"
        );
    }

    #[test]
    fn archive_formats() {
        assert_eq!(PlatformTarget::Windows.archive_format(), ArchiveFormat::Zip);
        assert_eq!(PlatformTarget::MacOs.archive_format(), ArchiveFormat::TarGz);
        assert_eq!(
            PlatformTarget::Linux(LinuxArch::Amd64).archive_format(),
            ArchiveFormat::TarGz
        );
    }

    #[test]
    fn host_arch_mapping() {
        assert_eq!(LinuxArch::from_host_arch("x86_64"), LinuxArch::Amd64);
        assert_eq!(LinuxArch::from_host_arch("aarch64"), LinuxArch::Arm64);
        assert_eq!(LinuxArch::from_host_arch("armv7l"), LinuxArch::Arm7);
        assert_eq!(
            LinuxArch::from_host_arch("riscv64"),
            LinuxArch::Other("riscv64".to_string())
        );
    }

    #[test]
    fn macos_bundle_sits_at_archive_root() {
        assert_eq!(PlatformTarget::MacOs.bundle_subdir("flet"), None);
        assert_eq!(
            PlatformTarget::Windows.bundle_subdir("flet").as_deref(),
            Some("flet")
        );
    }
}
