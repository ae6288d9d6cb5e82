//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for fvl-core integration tests.
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use fvl_common::{ArchiveFetcher, ArchiveFormat, Config, LinuxArch, PlatformTarget, Result, VersionTag};
use fvl_core::Resolver;
use tempfile::TempDir;

/// One archive member: path, contents, unix mode.
pub type Member = (&'static str, &'static [u8], u32);

/// Scratch home, working directory and temp dir wired into a `Config`.
pub struct TestHarness {
    pub root: TempDir,
    pub config: Config,
}

impl TestHarness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let temp_dir = root.path().join("tmp");
        fs::create_dir_all(&temp_dir).unwrap();
        let config = Config {
            product: "flet".to_string(),
            version: VersionTag::parse("0.25.2").unwrap(),
            releases_base_url: "https://github.com/flet-dev".to_string(),
            build_root: root.path().join("project/build"),
            view_path_override: None,
            bundled_dir: None,
            home_dir: root.path().join("home"),
            temp_dir,
            require_install_receipt: false,
        };
        TestHarness { root, config }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    pub fn resolver(&self, platform: PlatformTarget, fetcher: Arc<dyn ArchiveFetcher>) -> Resolver {
        Resolver::new(self.config.clone(), platform, fetcher)
    }

    /// Lays down a bundle matching `platform` in `dir` and returns its path.
    pub fn place_bundle(&self, platform: &PlatformTarget, dir: &Path) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        match platform {
            PlatformTarget::Windows => {
                let exe = dir.join("flet.exe");
                fs::write(&exe, b"MZ").unwrap();
                exe
            }
            PlatformTarget::MacOs => {
                let app = dir.join("Flet.app");
                fs::create_dir_all(app.join("Contents/MacOS")).unwrap();
                app
            }
            PlatformTarget::Linux(_) => {
                let exe = dir.join("flet");
                write_with_mode(&exe, b"#!/bin/sh\n", 0o755);
                exe
            }
        }
    }

    /// Directory inside the cache (or another root) where the bundle lives.
    pub fn bundle_dir_in(&self, platform: &PlatformTarget, root: &Path) -> PathBuf {
        match platform.bundle_subdir(&self.config.product) {
            Some(sub) => root.join(sub),
            None => root.to_path_buf(),
        }
    }
}

pub fn all_platforms() -> Vec<PlatformTarget> {
    let mut platforms = vec![PlatformTarget::Windows, PlatformTarget::MacOs];
    // Owner-execute bits only exist on unix hosts.
    if cfg!(unix) {
        platforms.push(PlatformTarget::Linux(LinuxArch::Amd64));
    }
    platforms
}

pub fn write_with_mode(path: &Path, data: &[u8], mode: u32) {
    fs::write(path, data).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }
    #[cfg(not(unix))]
    let _ = mode;
}

/// Release archive contents the way the real assets are laid out.
pub fn release_members(platform: &PlatformTarget) -> Vec<Member> {
    match platform {
        PlatformTarget::Windows => vec![
            ("flet/flet.exe", b"MZ", 0o644),
            ("flet/data/app.so", b"\0", 0o644),
        ],
        PlatformTarget::MacOs => vec![
            ("Flet.app/Contents/Info.plist", b"<plist/>", 0o644),
            ("Flet.app/Contents/MacOS/Flet", b"\xcf\xfa", 0o755),
        ],
        PlatformTarget::Linux(_) => vec![
            ("flet/flet", b"\x7fELF", 0o755),
            ("flet/lib/libapp.so", b"\x7fELF", 0o644),
            ("flet/data/icudtl.dat", b"\0", 0o644),
        ],
    }
}

pub fn write_archive(path: &Path, format: ArchiveFormat, members: &[Member]) {
    match format {
        ArchiveFormat::TarGz => {
            let file = File::create(path).unwrap();
            let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
            for (name, data, mode) in members {
                let mut header = tar::Header::new_gnu();
                header.set_size(data.len() as u64);
                header.set_mode(*mode);
                header.set_cksum();
                builder.append_data(&mut header, name, *data).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }
        ArchiveFormat::Zip => {
            let file = File::create(path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            for (name, data, mode) in members {
                let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
    }
}

/// Fails the test if anything tries to download.
pub struct PanicFetcher;

impl ArchiveFetcher for PanicFetcher {
    fn fetch(&self, url: &str, _dest: &Path) -> Result<()> {
        panic!("network access attempted: {url}");
    }
}

/// Serves a prebuilt archive and records every request.
pub struct FixtureFetcher {
    format: ArchiveFormat,
    members: Vec<Member>,
    calls: AtomicUsize,
    urls: std::sync::Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new(format: ArchiveFormat, members: Vec<Member>) -> Self {
        Self {
            format,
            members,
            calls: AtomicUsize::new(0),
            urls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn release(platform: &PlatformTarget) -> Self {
        Self::new(platform.archive_format(), release_members(platform))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl ArchiveFetcher for FixtureFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        write_archive(dest, self.format, &self.members);
        Ok(())
    }
}

/// Tar.gz whose entry names are written verbatim, bypassing the builder's
/// own path checks.
pub fn write_tar_gz_raw(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, data) in entries {
        let mut header = tar::Header::new_old();
        let raw = &mut header.as_old_mut().name;
        raw[..name.len()].copy_from_slice(name.as_bytes());
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Fetcher that hands out a fixed file, for archives built by hand.
pub struct CopyFetcher {
    pub source: PathBuf,
    pub calls: AtomicUsize,
}

impl CopyFetcher {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ArchiveFetcher for CopyFetcher {
    fn fetch(&self, _url: &str, dest: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::copy(&self.source, dest)?;
        Ok(())
    }
}
