//! Source acquisition.
//!
//! A `SourceFetcher` turns a `SourceSpec` into an unpacked tree on disk.
//! Every failure surfaces as `PackageError::Fetch`; a failed fetch leaves
//! nothing usable behind and the caller restarts from a clean work tree.

pub mod directory;
pub mod tarball;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use directory::DirectoryFetcher;
pub use tarball::TarballFetcher;

/// Where the upstream sources come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// `http(s)://` or `file://` URL, or a local archive path
    pub url: String,
    /// Expected SHA-256 of the archive, if pinned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl SourceSpec {
    pub fn new(url: impl Into<String>) -> Self {
        SourceSpec {
            url: url.into(),
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }
}

/// Acquires a source tree.
pub trait SourceFetcher {
    /// Human-readable description for status output.
    fn describe(&self, spec: &SourceSpec) -> String;

    /// Unpack the sources described by `spec` into `dest`.
    ///
    /// Returns the extraction directory (normally `dest`).
    fn fetch(&self, spec: &SourceSpec, dest: &Path) -> Result<PathBuf>;
}

/// The source root inside an extraction directory.
///
/// Archives usually wrap everything in one top-level directory; when the
/// extraction produced exactly one directory and nothing else, that
/// directory is the root. Otherwise the extraction directory is.
pub fn locate_source_root(extracted: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extracted)
        .with_context(|| format!("failed to read directory: {}", extracted.display()))?
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("failed to read directory: {}", extracted.display()))?;

    if let [only] = entries.as_slice() {
        if only.file_type()?.is_dir() {
            return Ok(only.path());
        }
    }
    Ok(extracted.to_path_buf())
}
