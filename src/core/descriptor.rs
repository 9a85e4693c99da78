//! Package descriptor - what consumers of the packaged library read.
//!
//! Paths in the descriptor are relative to the install root, except the
//! `PATH` additions in `env`, which are absolute because they are meant to
//! be appended to a process environment as-is.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::context::BuildContext;
use crate::core::requirement::Requirement;
use crate::util::fs::write_string;

/// Consumer-facing description of one packaged build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// The packaged requirement
    pub package: Requirement,

    /// SPDX license of the packaged library
    pub license: String,

    /// Upstream project homepage
    pub homepage: String,

    /// One-line description of the library
    pub description: String,

    /// Search topics
    pub topics: Vec<String>,

    /// Context this build was produced for
    pub context: BuildContext,

    /// Libraries to link (without prefix/suffix)
    pub libs: Vec<String>,

    /// Preprocessor defines consumers must set
    pub defines: Vec<String>,

    /// Apple frameworks to link
    pub frameworks: Vec<String>,

    /// Include search paths
    pub include_dirs: Vec<PathBuf>,

    /// Library search paths
    pub lib_dirs: Vec<PathBuf>,

    /// Executable/runtime directories
    pub bin_dirs: Vec<PathBuf>,

    /// Environment additions (`PATH` entries and the like)
    pub env: BTreeMap<String, Vec<PathBuf>>,

    /// Names downstream generators use (cmake_file_name, pkg_config_name, ...)
    pub properties: BTreeMap<String, String>,

    /// Requirements the library was built against
    pub requires: Vec<Requirement>,
}

impl PackageDescriptor {
    /// Whether a define is present.
    pub fn has_define(&self, define: &str) -> bool {
        self.defines.iter().any(|d| d == define)
    }

    /// Entries appended to the executable search path.
    pub fn path_additions(&self) -> &[PathBuf] {
        self.env.get("PATH").map(Vec::as_slice).unwrap_or(&[])
    }

    /// Serialize to pretty JSON at `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize package descriptor")?;
        write_string(path, &format!("{}\n", json))
    }

    /// Read a previously written descriptor.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read package descriptor: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse package descriptor: {}", path.display()))
    }
}
