//! Core data structures for Berth.
//!
//! This module contains the foundational types used throughout Berth:
//! - Build context (platform, architecture, compiler, variant)
//! - The declarative option model and its resolved form
//! - Requirements, install tree layout and the package descriptor
//! - The packaging error taxonomy

pub mod context;
pub mod descriptor;
pub mod errors;
pub mod install_tree;
pub mod language;
pub mod options;
pub mod requirement;

pub use context::{Arch, BuildContext, BuildType, CompilerFamily, CompilerIdentity, Platform, Variant};
pub use descriptor::PackageDescriptor;
pub use errors::PackageError;
pub use install_tree::InstallTree;
pub use language::CppStandard;
pub use options::{Applicability, OptionDecl, OptionModel, OptionOverride, OptionValue, ResolvedOptions};
pub use requirement::Requirement;
