//! Configuration file support for Berth.
//!
//! Berth supports two configuration file locations:
//! - Global: `~/.berth/config.toml` - User-wide defaults
//! - Project: `.berth/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::options::{OptionOverride, OptionValue};

/// Berth configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Option overrides (name -> value)
    pub options: BTreeMap<String, OptionValue>,

    /// Toolchain and target settings
    pub toolchain: ToolchainSettings,

    /// Source acquisition settings
    pub source: SourceConfig,

    /// Editor-configuration generator settings
    pub editor: EditorConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Library variant (shared, static)
    pub variant: Option<String>,

    /// CMake build type (Release, Debug, ...)
    pub build_type: Option<String>,

    /// Declared C++ standard
    pub cppstd: Option<String>,

    /// Number of parallel build jobs (None = build system default)
    pub jobs: Option<usize>,

    /// Working directory for source, build and package trees
    pub work_dir: Option<PathBuf>,

    /// CMake generator (e.g., "Ninja")
    pub generator: Option<String>,

    /// Directory with dependency find-modules, passed as CMAKE_MODULE_PATH
    pub module_path: Option<PathBuf>,
}

/// Toolchain and target settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Path to cmake
    pub cmake: Option<PathBuf>,

    /// Compiler family (gcc, clang, apple-clang, msvc)
    pub compiler: Option<String>,

    /// Compiler version
    pub compiler_version: Option<String>,

    /// Target platform (windows, macos, linux)
    pub platform: Option<String>,

    /// Target architecture (x86, x86_64, arm64)
    pub arch: Option<String>,
}

/// Source acquisition settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Override the upstream archive URL (mirror)
    pub url: Option<String>,

    /// Expected SHA256 of the archive
    pub sha256: Option<String>,

    /// Local archive to use instead of downloading
    pub archive: Option<PathBuf>,

    /// Local unpacked source tree to use instead of downloading
    pub dir: Option<PathBuf>,
}

/// Editor-configuration generator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Package cache root (`<root>/<name>/<version>/**/include`)
    pub cache_root: Option<PathBuf>,

    /// Additional roots scanned for every `include` directory
    pub extra_roots: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Build settings
        merge_opt(&mut self.build.variant, other.build.variant);
        merge_opt(&mut self.build.build_type, other.build.build_type);
        merge_opt(&mut self.build.cppstd, other.build.cppstd);
        merge_opt(&mut self.build.jobs, other.build.jobs);
        merge_opt(&mut self.build.work_dir, other.build.work_dir);
        merge_opt(&mut self.build.generator, other.build.generator);
        merge_opt(&mut self.build.module_path, other.build.module_path);

        // Options merge per key
        self.options.extend(other.options);

        // Toolchain settings
        merge_opt(&mut self.toolchain.cmake, other.toolchain.cmake);
        merge_opt(&mut self.toolchain.compiler, other.toolchain.compiler);
        merge_opt(&mut self.toolchain.compiler_version, other.toolchain.compiler_version);
        merge_opt(&mut self.toolchain.platform, other.toolchain.platform);
        merge_opt(&mut self.toolchain.arch, other.toolchain.arch);

        // Source settings
        merge_opt(&mut self.source.url, other.source.url);
        merge_opt(&mut self.source.sha256, other.source.sha256);
        merge_opt(&mut self.source.archive, other.source.archive);
        merge_opt(&mut self.source.dir, other.source.dir);

        // Editor settings
        merge_opt(&mut self.editor.cache_root, other.editor.cache_root);
        if !other.editor.extra_roots.is_empty() {
            self.editor.extra_roots = other.editor.extra_roots;
        }
    }

    /// Option overrides from the `[options]` table, in key order.
    ///
    /// String values are read like command-line values, so `"off"` is a
    /// boolean here too.
    pub fn option_overrides(&self) -> Vec<OptionOverride> {
        self.options
            .iter()
            .map(|(name, value)| OptionOverride {
                name: name.clone(),
                value: match value {
                    OptionValue::Str(s) => OptionValue::parse(s),
                    other => other.clone(),
                },
            })
            .collect()
    }
}

fn merge_opt<T>(slot: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *slot = other;
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.berth/config.toml)
/// 2. Global config (~/.berth/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global berth config directory (~/.berth).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".berth"))
}
