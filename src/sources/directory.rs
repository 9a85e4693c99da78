//! Already-unpacked local source trees.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::errors::PackageError;
use crate::sources::{SourceFetcher, SourceSpec};
use crate::util::fs::copy_dir_all;

/// Copies a local source tree into the work directory.
///
/// The tree is copied rather than used in place because patching mutates
/// it.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    dir: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryFetcher { dir: dir.into() }
    }
}

impl SourceFetcher for DirectoryFetcher {
    fn describe(&self, _spec: &SourceSpec) -> String {
        self.dir.display().to_string()
    }

    fn fetch(&self, _spec: &SourceSpec, dest: &Path) -> Result<PathBuf> {
        let location = self.dir.display().to_string();
        if !self.dir.is_dir() {
            return Err(PackageError::fetch(location, "source directory does not exist").into());
        }

        tracing::info!("Copying sources from {}", self.dir.display());
        copy_dir_all(&self.dir, dest).map_err(|e| PackageError::fetch(location, format!("{:#}", e)))?;
        Ok(dest.to_path_buf())
    }
}
