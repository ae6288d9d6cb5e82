// fvl-common/src/version.rs
//! Release version of the view bundle. Resolved once at startup through a
//! [`VersionProvider`] and then carried by value in [`crate::Config`].

use std::env;
use std::fmt;

use tracing::debug;

use crate::error::{FvlError, Result};

/// A validated release tag, stored without the leading `v`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let tag = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if tag.is_empty() {
            return Err(FvlError::Version(format!("empty version tag '{raw}'")));
        }
        // The tag becomes part of a cache path and a URL.
        if tag
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\')
            || tag == "."
            || tag == ".."
        {
            return Err(FvlError::Version(format!("invalid version tag '{raw}'")));
        }
        Ok(Self(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait VersionProvider {
    fn resolve_version(&self) -> Result<VersionTag>;
}

/// A fixed version, e.g. compiled in or passed by the embedding application.
#[derive(Debug, Clone)]
pub struct StaticVersion(pub String);

impl VersionProvider for StaticVersion {
    fn resolve_version(&self) -> Result<VersionTag> {
        VersionTag::parse(&self.0)
    }
}

/// Reads the version from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvVersion {
    pub var: String,
}

impl EnvVersion {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl VersionProvider for EnvVersion {
    fn resolve_version(&self) -> Result<VersionTag> {
        match env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => VersionTag::parse(&value),
            _ => Err(FvlError::Version(format!("{} is not set", self.var))),
        }
    }
}

/// Tries each provider in order and returns the first tag produced.
pub struct FirstAvailable(pub Vec<Box<dyn VersionProvider>>);

impl VersionProvider for FirstAvailable {
    fn resolve_version(&self) -> Result<VersionTag> {
        let mut last_error = None;
        for provider in &self.0 {
            match provider.resolve_version() {
                Ok(tag) => return Ok(tag),
                Err(e) => {
                    debug!("Version provider skipped: {}", e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| FvlError::Version("no version providers configured".to_string())))
    }
}
