//! Berth - build, patch and package a pinned OpenColorIO snapshot
//!
//! This crate provides the core library functionality for Berth: option
//! resolution, source acquisition and patching, CMake configuration and
//! invocation, install-tree normalization and package descriptor emission.

pub mod builder;
pub mod core;
pub mod ops;
pub mod recipe;
pub mod sources;
pub mod util;

/// Test utilities and mocks for Berth unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording build system and fixtures for
/// source trees, install trees and tarballs.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildContext, PackageDescriptor, PackageError};
pub use ops::package::{package, PackageOutcome, WorkLayout};
pub use recipe::Recipe;
pub use util::context::GlobalContext;
