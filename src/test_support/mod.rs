//! Test utilities and mocks for Berth unit tests.
//!
//! `FakeBuildSystem` stands in for CMake: it records every call and, on
//! install, writes a raw install tree shaped like the one OpenColorIO's
//! CMake install step produces.
//!
//! # Example
//!
//! ```rust,ignore
//! let fake = FakeBuildSystem::new().fail_on("build", 2);
//! let invoker = BuildInvoker::new(&fake);
//! ```

pub mod fixtures;

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;

use crate::builder::cmake::BuildSystem;
use crate::builder::configure::{BuildConfiguration, ConfigValue};
use crate::core::context::{BuildType, Variant};
use crate::core::errors::PackageError;

// Re-export fixtures for convenience
pub use fixtures::*;

/// Recording stand-in for an external build system.
#[derive(Debug, Default)]
pub struct FakeBuildSystem {
    calls: Mutex<Vec<String>>,
    configured: Mutex<Vec<BuildConfiguration>>,
    fail: Option<(String, i32)>,
}

impl FakeBuildSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `phase` exit with `code`.
    pub fn fail_on(mut self, phase: &str, code: i32) -> Self {
        self.fail = Some((phase.to_string(), code));
        self
    }

    /// Phases invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Fingerprints of every configuration passed to `configure`.
    pub fn configured_with(&self) -> Vec<String> {
        self.configured
            .lock()
            .unwrap()
            .iter()
            .map(BuildConfiguration::fingerprint)
            .collect()
    }

    fn record(&self, phase: &str) -> Result<()> {
        self.calls.lock().unwrap().push(phase.to_string());
        match &self.fail {
            Some((failing, code)) if failing == phase => Err(PackageError::BuildInvocation {
                phase: phase.to_string(),
                command: format!("fake {}", phase),
                status: Some(*code),
                stderr: format!("{} exploded", phase),
            }
            .into()),
            _ => Ok(()),
        }
    }

    fn last_variant(&self) -> Variant {
        let configured = self.configured.lock().unwrap();
        match configured.last().and_then(|c| c.get("BUILD_SHARED_LIBS")) {
            Some(ConfigValue::Bool(false)) => Variant::Static,
            _ => Variant::Shared,
        }
    }
}

impl BuildSystem for FakeBuildSystem {
    fn configure(&self, _source_dir: &Path, _build_dir: &Path, config: &BuildConfiguration) -> Result<()> {
        self.configured.lock().unwrap().push(config.clone());
        self.record("configure")
    }

    fn build(&self, _build_dir: &Path, _build_type: BuildType, _jobs: Option<usize>) -> Result<()> {
        self.record("build")
    }

    fn install(&self, _build_dir: &Path, prefix: &Path, _build_type: BuildType) -> Result<()> {
        self.record("install")?;
        write_raw_install_tree(prefix, self.last_variant());
        Ok(())
    }
}
