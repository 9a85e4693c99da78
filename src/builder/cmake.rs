//! CMake driver and the configure-once build invoker.
//!
//! `BuildInvoker::configure_once` is the only way to obtain a
//! `ConfiguredBuild`, and `build`/`install` only accept that handle, so both
//! phases necessarily run against the configuration that was actually
//! handed to CMake.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::configure::BuildConfiguration;
use crate::core::context::BuildType;
use crate::core::errors::PackageError;
use crate::util::fs::{ensure_dir, read_to_string, write_string};
use crate::util::process::{find_cmake, ProcessBuilder};

/// Name of the configuration stamp written into the build directory.
pub const CONFIGURATION_STAMP: &str = "berth-configuration.json";

/// An external native build system.
pub trait BuildSystem {
    /// Generate the build tree for `source_dir` in `build_dir`.
    fn configure(&self, source_dir: &Path, build_dir: &Path, config: &BuildConfiguration) -> Result<()>;

    /// Compile the configured build tree.
    fn build(&self, build_dir: &Path, build_type: BuildType, jobs: Option<usize>) -> Result<()>;

    /// Install the built artifacts under `prefix`.
    fn install(&self, build_dir: &Path, prefix: &Path, build_type: BuildType) -> Result<()>;
}

/// CMake, invoked as an external process.
#[derive(Debug, Clone)]
pub struct CMake {
    program: PathBuf,
    generator: Option<String>,
}

impl CMake {
    /// Use a specific cmake binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CMake {
            program: program.into(),
            generator: None,
        }
    }

    /// Find cmake on PATH.
    pub fn discover() -> Result<Self> {
        let Some(program) = find_cmake() else {
            bail!(
                "CMake not found\n\
                 \n\
                 CMake is required to build OpenColorIO.\n\
                 Install CMake and ensure it's in your PATH, or set `toolchain.cmake`."
            );
        };
        Ok(CMake::new(program))
    }

    /// Use a specific generator (e.g. "Ninja").
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn configure_command(&self, source_dir: &Path, build_dir: &Path, config: &BuildConfiguration) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .arg("-S")
            .arg(source_dir)
            .arg("-B")
            .arg(build_dir);

        if let Some(generator) = &self.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        cmd.args(config.to_cmake_args())
    }

    pub fn build_command(&self, build_dir: &Path, build_type: BuildType, jobs: Option<usize>) -> ProcessBuilder {
        // --config matters for multi-config generators like Visual Studio
        let cmd = ProcessBuilder::new(&self.program)
            .arg("--build")
            .arg(build_dir)
            .arg("--config")
            .arg(build_type.as_str())
            .arg("--parallel");

        match jobs {
            Some(jobs) => cmd.arg(jobs.to_string()),
            None => cmd,
        }
    }

    pub fn install_command(&self, build_dir: &Path, prefix: &Path, build_type: BuildType) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .arg("--install")
            .arg(build_dir)
            .arg("--prefix")
            .arg(prefix)
            .arg("--config")
            .arg(build_type.as_str())
    }

    fn run(&self, phase: &str, cmd: ProcessBuilder) -> Result<()> {
        tracing::debug!("running: {}", cmd.display_command());
        let output = cmd.exec()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            tracing::debug!("{}", line);
        }

        if !output.status.success() {
            // Generators differ in which stream carries the compiler errors
            let mut captured = String::from_utf8_lossy(&output.stderr).into_owned();
            if captured.trim().is_empty() {
                captured = stdout.into_owned();
            }
            return Err(PackageError::BuildInvocation {
                phase: phase.to_string(),
                command: cmd.display_command(),
                status: output.status.code(),
                stderr: captured,
            }
            .into());
        }
        Ok(())
    }
}

impl BuildSystem for CMake {
    fn configure(&self, source_dir: &Path, build_dir: &Path, config: &BuildConfiguration) -> Result<()> {
        self.run("configure", self.configure_command(source_dir, build_dir, config))
    }

    fn build(&self, build_dir: &Path, build_type: BuildType, jobs: Option<usize>) -> Result<()> {
        self.run("build", self.build_command(build_dir, build_type, jobs))
    }

    fn install(&self, build_dir: &Path, prefix: &Path, build_type: BuildType) -> Result<()> {
        self.run("install", self.install_command(build_dir, prefix, build_type))
    }
}

/// Contents of the configuration stamp.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigurationStamp {
    fingerprint: String,
    configuration: BuildConfiguration,
}

/// A configured build tree. Only `BuildInvoker::configure_once` creates one.
#[derive(Debug)]
pub struct ConfiguredBuild {
    configuration: BuildConfiguration,
    fingerprint: String,
    build_dir: PathBuf,
    build_type: BuildType,
}

impl ConfiguredBuild {
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn stamp_path(&self) -> PathBuf {
        self.build_dir.join(CONFIGURATION_STAMP)
    }

    fn into_configuration(self) -> BuildConfiguration {
        self.configuration
    }
}

/// Drives a `BuildSystem` through configure, build and install.
pub struct BuildInvoker<'a> {
    system: &'a dyn BuildSystem,
    jobs: Option<usize>,
}

impl<'a> BuildInvoker<'a> {
    pub fn new(system: &'a dyn BuildSystem) -> Self {
        BuildInvoker { system, jobs: None }
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Configure the build tree once and return the handle both later
    /// phases run against.
    pub fn configure_once(
        &self,
        configuration: BuildConfiguration,
        source_dir: &Path,
        build_dir: &Path,
        build_type: BuildType,
    ) -> Result<ConfiguredBuild> {
        ensure_dir(build_dir)?;
        self.system.configure(source_dir, build_dir, &configuration)?;

        let handle = ConfiguredBuild {
            fingerprint: configuration.fingerprint(),
            configuration,
            build_dir: build_dir.to_path_buf(),
            build_type,
        };

        let stamp = ConfigurationStamp {
            fingerprint: handle.fingerprint.clone(),
            configuration: handle.configuration.clone(),
        };
        let json = serde_json::to_string_pretty(&stamp).context("failed to serialize configuration stamp")?;
        write_string(&handle.stamp_path(), &json)?;

        tracing::info!("configured {} ({} keys)", build_dir.display(), handle.configuration.len());
        Ok(handle)
    }

    /// Compile the configured tree.
    pub fn build(&self, handle: &ConfiguredBuild) -> Result<()> {
        self.system.build(&handle.build_dir, handle.build_type, self.jobs)
    }

    /// Install into `install_dir`, after checking the build tree still
    /// carries the handle's configuration.
    pub fn install(&self, handle: &ConfiguredBuild, install_dir: &Path) -> Result<()> {
        self.check_stamp(handle)?;
        ensure_dir(install_dir)?;
        self.system.install(&handle.build_dir, install_dir, handle.build_type)
    }

    /// Consume the handle, returning the configuration it was built with.
    pub fn finish(&self, handle: ConfiguredBuild) -> BuildConfiguration {
        handle.into_configuration()
    }

    fn check_stamp(&self, handle: &ConfiguredBuild) -> Result<()> {
        let path = handle.stamp_path();
        let drift = |message: String| -> anyhow::Error {
            PackageError::BuildInvocation {
                phase: "install".to_string(),
                command: format!("verify {}", path.display()),
                status: None,
                stderr: message,
            }
            .into()
        };

        let content = read_to_string(&path).map_err(|e| drift(format!("configuration stamp unreadable: {:#}", e)))?;
        let stamp: ConfigurationStamp = serde_json::from_str(&content)
            .map_err(|e| drift(format!("configuration stamp is corrupt: {}", e)))?;

        if stamp.fingerprint != handle.fingerprint {
            return Err(drift(format!(
                "configuration drift: build tree has {}, handle has {}",
                stamp.fingerprint, handle.fingerprint
            )));
        }
        Ok(())
    }
}
