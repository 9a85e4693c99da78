//! Packaging recipes.
//!
//! A recipe is the declarative half of a package: what to fetch, how to
//! patch it, which options exist and what consumers are told about the
//! result. The pipeline in `ops::package` supplies the procedure.

pub mod opencolorio;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::builder::patch::PatchRule;
use crate::core::language::CppStandard;
use crate::core::options::OptionModel;
use crate::core::requirement::{parse_lenient_version, Requirement};
use crate::sources::SourceSpec;

/// Everything known about a pinned package before it is built.
#[derive(Debug, Clone)]
pub struct Recipe {
    /// The packaged requirement (`name/version`)
    pub requirement: Requirement,
    pub description: String,
    /// SPDX license identifier
    pub license: String,
    pub homepage: String,
    pub topics: Vec<String>,

    /// Upstream source snapshot
    pub source: SourceSpec,
    /// Source patches, applied in order
    pub patches: Vec<PatchRule>,
    /// Declared options
    pub options: OptionModel,
    /// Requirements the library is built against (recorded, not resolved)
    pub requires: Vec<Requirement>,
    /// Lowest C++ standard the sources compile with
    pub min_cppstd: CppStandard,

    /// Libraries consumers link
    pub libs: Vec<String>,
    /// Frameworks consumers link on macOS
    pub apple_frameworks: Vec<String>,
    /// Names used by downstream generators
    pub properties: BTreeMap<String, String>,
    /// License file, relative to the source root
    pub license_file: String,
}

impl Recipe {
    /// The recipe version as semver.
    pub fn version(&self) -> Result<semver::Version> {
        parse_lenient_version(&self.requirement.version)
    }
}
