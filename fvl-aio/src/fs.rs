/*
File: fvl-aio/src/fs.rs
Purpose: Directory probes used to locate view bundles, plus small removal helpers.
*/
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fvl_common::error::{FvlError, Result};
use glob::{glob_with, MatchOptions, Pattern};
use tracing::{debug, error, warn};

/// What a probe is allowed to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Immediate entries of `dir` named `*.<ext>` (case-insensitive) of the given kind.
///
/// A missing directory is not an error; it simply has no matches.
pub fn find_by_extension(dir: &Path, ext: &str, kind: EntryKind) -> Result<Vec<PathBuf>> {
    let escaped_dir = Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&escaped_dir).join(format!("*.{ext}"));
    let pattern_str = pattern.to_string_lossy();
    debug!("Probing {}", pattern_str);

    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let paths = glob_with(&pattern_str, options)
        .map_err(|e| FvlError::Generic(format!("Invalid probe pattern '{pattern_str}': {e}")))?;

    let mut found = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                let keep = match kind {
                    EntryKind::File => path.is_file(),
                    EntryKind::Dir => path.is_dir(),
                };
                if keep {
                    found.push(path);
                }
            }
            Err(e) => warn!("Skipping unreadable entry while probing {}: {}", dir.display(), e),
        }
    }
    found.sort();
    Ok(found)
}

/// Immediate regular files of `dir` whose owner-execute bit is set, whatever
/// their name. Symlinks are followed, as a shell would.
#[cfg(unix)]
pub fn find_owner_executables(dir: &Path) -> Result<Vec<PathBuf>> {
    use std::os::unix::fs::PermissionsExt;

    debug!("Scanning {} for executables", dir.display());
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) if e.kind() == io::ErrorKind::NotADirectory => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Ok(metadata) = fs::metadata(&path) else {
            debug!("Cannot stat {}, skipping", path.display());
            continue;
        };
        if metadata.is_file() && metadata.permissions().mode() & 0o100 != 0 {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(not(unix))]
pub fn find_owner_executables(dir: &Path) -> Result<Vec<PathBuf>> {
    debug!(
        "Owner-execute bits are not available on this platform; {} has no matches",
        dir.display()
    );
    Ok(Vec::new())
}

/// Removes a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed file: {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            error!("Failed remove file {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}

/// Removes a directory tree, treating "already gone" as success.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed directory recursively: {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            error!("Failed remove dir_all {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}
