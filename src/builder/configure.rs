//! Build configuration assembly.
//!
//! The configuration is a sorted key -> value map handed to CMake as
//! `-DKEY=VALUE` definitions. It is derived once per run from the resolved
//! options, the build context and the recipe version, layered lowest
//! precedence first:
//!
//! 1. policy flags that turn off subsystems a packaged library never needs
//! 2. context flags (build type, C++ standard, module path, SSE, PIC)
//! 3. variant flags (shared vs static, MSVC import suppression)
//! 4. version-gated toggles around the 2.1.0 boundary
//!
//! A final pass drops every key owned by an option that did not resolve.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::context::BuildContext;
use crate::core::options::{OptionModel, ResolvedOptions};
use crate::recipe::opencolorio::{OPTION_FPIC, OPTION_USE_SSE};
use crate::util::fs::slash_path;
use crate::util::hash::Fingerprint;

/// First version whose build drops the legacy shared/static/pyglue keys.
pub const PYTHON_TOGGLE_VERSION: semver::Version = semver::Version::new(2, 1, 0);

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Str(String),
}

impl ConfigValue {
    /// The value as CMake expects it on the command line.
    pub fn render(&self) -> String {
        match self {
            ConfigValue::Bool(true) => "ON".to_string(),
            ConfigValue::Bool(false) => "OFF".to_string(),
            ConfigValue::Str(s) => s.clone(),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Str(s)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Sorted configuration map passed to the build system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildConfiguration {
    entries: BTreeMap<String, ConfigValue>,
}

impl BuildConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, overwriting any earlier layer's value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `-DKEY=VALUE` arguments in key order.
    pub fn to_cmake_args(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, v)| format!("-D{}={}", k, v.render()))
            .collect()
    }

    /// SHA-256 over the rendered entries in key order.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        for (key, value) in &self.entries {
            fp.update_str(key).update_str(&value.render());
        }
        fp.finish()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize build configuration")
    }
}

/// Assemble the build configuration for one context.
///
/// Pure: identical inputs give an identical map.
pub fn assemble(
    model: &OptionModel,
    resolved: &ResolvedOptions,
    ctx: &BuildContext,
    version: &semver::Version,
) -> BuildConfiguration {
    let mut config = BuildConfiguration::new();

    apply_policy(&mut config);
    apply_context(&mut config, resolved, ctx);
    apply_variant(&mut config, ctx);
    apply_version_gate(&mut config, ctx, version);

    // Keys owned by options absent from the resolved set must not leak
    for decl in model.iter() {
        if resolved.contains(&decl.name) {
            continue;
        }
        if let Some(key) = &decl.config_key {
            if config.remove(key).is_some() {
                tracing::debug!("dropped `{}`: option `{}` not resolved", key, decl.name);
            }
        }
    }

    config
}

fn apply_policy(config: &mut BuildConfiguration) {
    config.set("OCIO_BUILD_APPS", false);
    config.set("OCIO_BUILD_DOCS", false);
    config.set("OCIO_BUILD_TESTS", false);
    config.set("OCIO_BUILD_GPU_TESTS", false);
    config.set("OCIO_USE_BOOST_PTR", false);
    // Dependencies come from the consumer's graph, never downloaded by CMake
    config.set("OCIO_INSTALL_EXT_PACKAGE", "NONE");
    config.set("OCIO_USE_OPENEXR_HALF", true);
}

fn apply_context(config: &mut BuildConfiguration, resolved: &ResolvedOptions, ctx: &BuildContext) {
    config.set("CMAKE_BUILD_TYPE", ctx.build_type.as_str());

    if let Some(std) = ctx.cppstd {
        config.set("CMAKE_CXX_STANDARD", std.as_number());
    }

    if let Some(module_path) = &ctx.module_path {
        config.set("CMAKE_MODULE_PATH", slash_path(module_path));
    }

    if let Some(use_sse) = resolved.get_bool(OPTION_USE_SSE) {
        config.set("OCIO_USE_SSE", use_sse && ctx.arch.supports_sse());
    }

    if let Some(fpic) = resolved.get_bool(OPTION_FPIC) {
        config.set("CMAKE_POSITION_INDEPENDENT_CODE", fpic);
    }
}

fn apply_variant(config: &mut BuildConfiguration, ctx: &BuildContext) {
    config.set("BUILD_SHARED_LIBS", ctx.variant.is_shared());

    // The headers guard on #ifndef, so any value works
    if ctx.is_msvc_static() {
        config.set("OpenColorIO_SKIP_IMPORTS", true);
    }
}

fn apply_version_gate(config: &mut BuildConfiguration, ctx: &BuildContext, version: &semver::Version) {
    if *version >= PYTHON_TOGGLE_VERSION {
        config.set("OCIO_BUILD_PYTHON", false);
    } else {
        config.set("OCIO_BUILD_SHARED", ctx.variant.is_shared());
        config.set("OCIO_BUILD_STATIC", ctx.variant.is_static());
        config.set("OCIO_BUILD_PYGLUE", false);
        config.set("USE_EXTERNAL_YAML", true);
        config.set("USE_EXTERNAL_TINYXML", true);
        config.set("USE_EXTERNAL_LCMS", true);
    }
}
