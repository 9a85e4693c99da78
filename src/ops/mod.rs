//! High-level operations.
//!
//! This module contains the implementation of Berth commands.

pub mod editor_config;
pub mod package;

pub use editor_config::{
    find_include_dir, generate, merge_include_paths, parse_requirements, scan_include_dirs, write_document,
};
pub use package::{package, PackageOptions, PackageOutcome, WorkLayout};
