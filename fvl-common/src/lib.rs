// fvl-common/src/lib.rs
pub mod config;
pub mod error;
pub mod fetch;
pub mod platform;
pub mod version;

// Re-export key types
pub use config::Config;
pub use error::{FvlError, Result};
pub use fetch::ArchiveFetcher;
pub use platform::{ArchiveFormat, BundleKind, LinuxArch, PlatformTarget};
pub use version::{VersionProvider, VersionTag};
