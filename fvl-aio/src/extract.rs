// fvl-aio/src/extract.rs
// Unpacks release archives. Archives arrive over the network, so every entry
// and every link target is checked against the destination before anything
// is written; one bad entry fails the whole extraction.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use fvl_common::error::{FvlError, Result};
use fvl_common::platform::ArchiveFormat;
use tar::{Archive, EntryType};
use tracing::{debug, error, warn};
use zip::read::ZipArchive;

/// Extracts `archive_path` into `target_dir`, creating it if needed.
pub fn extract_archive(archive_path: &Path, target_dir: &Path, format: ArchiveFormat) -> Result<()> {
    debug!(
        "Extracting archive '{}' ({:?}) to '{}'",
        archive_path.display(),
        format,
        target_dir.display()
    );

    fs::create_dir_all(target_dir).map_err(|e| {
        FvlError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!(
                "Failed to create target directory {}: {}",
                target_dir.display(),
                e
            ),
        )))
    })?;

    let file = File::open(archive_path).map_err(|e| {
        FvlError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!("Failed to open archive {}: {}", archive_path.display(), e),
        )))
    })?;

    match format {
        ArchiveFormat::Zip => extract_zip_archive(file, target_dir, archive_path),
        ArchiveFormat::TarGz => {
            let tar = GzDecoder::new(file);
            extract_tar_archive(tar, target_dir, archive_path)
        }
    }
}

/// Resolves an archive-relative path lexically, returning `None` if it is
/// absolute or climbs above the archive root.
fn contained_relative_path(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Normal(p) => out.push(p),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Entry names may not contain `..` at all, even when it would cancel out.
fn safe_entry_path(path: &Path) -> Option<PathBuf> {
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return None;
    }
    contained_relative_path(path).filter(|p| p.components().next().is_some())
}

/// A symlink's target is resolved relative to the directory holding the link.
fn symlink_stays_inside(entry_path: &Path, link_target: &Path) -> bool {
    if link_target.is_absolute() || link_target.has_root() {
        return false;
    }
    let base = entry_path.parent().unwrap_or_else(|| Path::new(""));
    contained_relative_path(&base.join(link_target)).is_some()
}

fn unsafe_entry(archive: &Path, entry: &Path) -> FvlError {
    error!(
        "Path traversal attempt '{}' in {}",
        entry.display(),
        archive.display()
    );
    FvlError::UnsafeArchiveEntry {
        archive: archive.to_path_buf(),
        entry: entry.display().to_string(),
    }
}

fn extraction_error(archive: &Path, reason: String) -> FvlError {
    error!("{}", reason);
    FvlError::ArchiveExtraction {
        archive: archive.to_path_buf(),
        reason,
    }
}

fn extract_tar_archive<R: Read>(
    reader: R,
    target_dir: &Path,
    archive_path_for_log: &Path,
) -> Result<()> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    debug!(
        "Starting TAR extraction for {}",
        archive_path_for_log.display()
    );

    let entries = archive.entries().map_err(|e| {
        extraction_error(
            archive_path_for_log,
            format!("Cannot read TAR entries: {e}"),
        )
    })?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| {
            extraction_error(
                archive_path_for_log,
                format!("Error reading TAR entry: {e}"),
            )
        })?;

        let path_in_archive: PathBuf = entry
            .path()
            .map_err(|e| {
                extraction_error(
                    archive_path_for_log,
                    format!("Invalid path in TAR entry: {e}"),
                )
            })?
            .into_owned();

        if path_in_archive.components().next().is_none() {
            continue;
        }
        if safe_entry_path(&path_in_archive).is_none() {
            return Err(unsafe_entry(archive_path_for_log, &path_in_archive));
        }

        let entry_type = entry.header().entry_type();
        if entry_type == EntryType::Symlink || entry_type == EntryType::Link {
            let link_target = entry
                .link_name()
                .map_err(|e| {
                    extraction_error(
                        archive_path_for_log,
                        format!(
                            "Invalid link target for {}: {e}",
                            path_in_archive.display()
                        ),
                    )
                })?
                .map(|l| l.into_owned())
                .ok_or_else(|| {
                    extraction_error(
                        archive_path_for_log,
                        format!("Link entry {} has no target", path_in_archive.display()),
                    )
                })?;
            let inside = if entry_type == EntryType::Symlink {
                symlink_stays_inside(&path_in_archive, &link_target)
            } else {
                // Hard link targets are archive-root relative.
                safe_entry_path(&link_target).is_some()
            };
            if !inside {
                return Err(unsafe_entry(archive_path_for_log, &path_in_archive));
            }
        }

        match entry.unpack_in(target_dir) {
            Ok(true) => debug!(
                "Unpacked TAR entry {} into {}",
                path_in_archive.display(),
                target_dir.display()
            ),
            Ok(false) => {
                // tar refused the entry (e.g. it would write through a symlink).
                return Err(unsafe_entry(archive_path_for_log, &path_in_archive));
            }
            Err(e) => {
                return Err(extraction_error(
                    archive_path_for_log,
                    format!(
                        "Failed to unpack entry {} to {}: {}",
                        path_in_archive.display(),
                        target_dir.display(),
                        e
                    ),
                ));
            }
        }
    }

    debug!(
        "Finished TAR extraction for {}",
        archive_path_for_log.display()
    );
    Ok(())
}

fn extract_zip_archive<R: Read + Seek>(
    reader: R,
    target_dir: &Path,
    archive_path_for_log: &Path,
) -> Result<()> {
    let mut archive = ZipArchive::new(reader).map_err(|e| {
        extraction_error(archive_path_for_log, format!("Failed to open ZIP: {e}"))
    })?;
    debug!(
        "Starting ZIP extraction for {} ({} entries)",
        archive_path_for_log.display(),
        archive.len()
    );

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| {
            extraction_error(
                archive_path_for_log,
                format!("Error reading ZIP index {i}: {e}"),
            )
        })?;

        let raw_name = PathBuf::from(file.name());
        let relative = match (safe_entry_path(&raw_name), file.enclosed_name()) {
            (Some(relative), Some(_)) => relative,
            _ => return Err(unsafe_entry(archive_path_for_log, &raw_name)),
        };
        let final_path = target_dir.join(&relative);

        if file.is_dir() {
            fs::create_dir_all(&final_path)?;
            continue;
        }

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if file.is_symlink() {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            let link_target = PathBuf::from(String::from_utf8_lossy(&buf).to_string());
            if !symlink_stays_inside(&relative, &link_target) {
                return Err(unsafe_entry(archive_path_for_log, &raw_name));
            }
            #[cfg(unix)]
            {
                if final_path.symlink_metadata().is_ok() {
                    let _ = fs::remove_file(&final_path);
                }
                std::os::unix::fs::symlink(&link_target, &final_path)?;
            }
            #[cfg(not(unix))]
            {
                warn!(
                    "Cannot create symlink on non-unix system: {} -> {}",
                    final_path.display(),
                    link_target.display()
                );
            }
            continue;
        }

        if final_path.symlink_metadata().is_ok() {
            match fs::remove_file(&final_path) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        let mut out_file = File::create(&final_path).map_err(|e| {
            extraction_error(
                archive_path_for_log,
                format!("Failed create file {}: {}", final_path.display(), e),
            )
        })?;
        io::copy(&mut file, &mut out_file).map_err(|e| {
            extraction_error(
                archive_path_for_log,
                format!("Failed write file {}: {}", final_path.display(), e),
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                if let Err(e) =
                    fs::set_permissions(&final_path, fs::Permissions::from_mode(mode & 0o7777))
                {
                    warn!(
                        "Failed set permissions on ZIP entry {}: {}",
                        final_path.display(),
                        e
                    );
                }
            }
        }
        debug!("Extracted ZIP entry to: {}", final_path.display());
    }

    debug!(
        "Finished ZIP extraction for {}",
        archive_path_for_log.display()
    );
    Ok(())
}
