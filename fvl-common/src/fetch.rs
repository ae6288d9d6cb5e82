use std::path::Path;

use crate::error::Result;

/// Downloads a release archive to `dest`.
///
/// Implemented over HTTP by `fvl-net`; the resolver only sees this trait so
/// callers can plug in a pre-seeded or offline source.
pub trait ArchiveFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}
