//! Global context for Berth operations.
//!
//! Provides centralized access to the working directory, the user-wide
//! Berth home and the merged configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_dir, load_config, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Berth data (~/.berth/)
    home: PathBuf,

    /// Merged global + project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context for a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = global_config_dir().unwrap_or_else(|| PathBuf::from(".berth"));
        Self::with_paths(cwd, home)
    }

    /// Create a context with explicit working and home directories.
    pub fn with_paths(cwd: PathBuf, home: PathBuf) -> Self {
        let config = load_config(&home.join("config.toml"), &cwd.join(".berth").join("config.toml"));
        GlobalContext { cwd, home, config }
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the project-local Berth directory.
    pub fn project_berth_dir(&self) -> PathBuf {
        self.cwd.join(".berth")
    }

    /// Work directory for packaging runs.
    ///
    /// `[build].work_dir` if configured (relative to cwd), else `.berth/work`.
    pub fn work_dir(&self) -> PathBuf {
        match &self.config.build.work_dir {
            Some(dir) => self.resolve_path(dir),
            None => self.project_berth_dir().join("work"),
        }
    }

    /// Default package cache root for the editor-config generator.
    pub fn package_cache_dir(&self) -> PathBuf {
        match &self.config.editor.cache_root {
            Some(dir) => self.resolve_path(dir),
            None => self.home.join("packages"),
        }
    }

    /// Resolve a possibly relative path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
