// fvl-core/src/token.rs
//! Launch tokens: pid files handed to the view on its command line. The view
//! writes its own pid into the file; `close` reads it back.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fvl_common::error::{FvlError, Result};
use rand::distr::Alphanumeric;
use rand::Rng;
use tracing::debug;

const TOKEN_NAME_LEN: usize = 20;
const CREATE_ATTEMPTS: usize = 8;

fn random_name() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_NAME_LEN)
        .map(char::from)
        .collect()
}

/// Creates a new, empty token file in `dir` with a unique random name.
pub fn create_token(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    for _ in 0..CREATE_ATTEMPTS {
        let candidate = dir.join(random_name());
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => {
                debug!("Created launch token {}", candidate.display());
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(FvlError::Generic(format!(
        "Could not create a unique launch token in {}",
        dir.display()
    )))
}

/// The pid the view wrote into its token, if it has written one yet.
pub fn read_pid(path: &Path) -> Option<u32> {
    let contents = fs::read_to_string(path).ok()?;
    match contents.trim().parse::<u32>() {
        Ok(pid) => Some(pid),
        Err(_) => {
            debug!(
                "Token {} does not hold a pid ({:?})",
                path.display(),
                contents.trim()
            );
            None
        }
    }
}
