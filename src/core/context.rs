//! Build context - platform, architecture, compiler and variant.
//!
//! A `BuildContext` identifies the single (platform, compiler, option)
//! tuple a packaging run targets. Option applicability, configuration
//! assembly and descriptor emission are all pure functions of it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::errors::PackageError;
use crate::core::language::CppStandard;

/// Target operating system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
    Freebsd,
    #[serde(untagged)]
    Other(String),
}

impl Platform {
    /// The platform of the running process.
    pub fn host() -> Self {
        std::env::consts::OS
            .parse()
            .unwrap_or_else(|_| Platform::Other(std::env::consts::OS.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
            Platform::Freebsd => "freebsd",
            Platform::Other(s) => s,
        }
    }

    /// Whether this is the Apple desktop platform.
    pub fn is_apple_desktop(&self) -> bool {
        matches!(self, Platform::Macos)
    }
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win" => Platform::Windows,
            "macos" | "darwin" | "osx" | "mac" => Platform::Macos,
            "linux" => Platform::Linux,
            "freebsd" => Platform::Freebsd,
            other => Platform::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    X86,
    X86_64,
    Armv7,
    #[serde(alias = "aarch64")]
    Arm64,
    #[serde(untagged)]
    Other(String),
}

impl Arch {
    /// The architecture of the running process.
    pub fn host() -> Self {
        std::env::consts::ARCH
            .parse()
            .unwrap_or_else(|_| Arch::Other(std::env::consts::ARCH.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Armv7 => "armv7",
            Arch::Arm64 => "arm64",
            Arch::Other(s) => s,
        }
    }

    /// Whether SSE vector instructions exist on this architecture.
    pub fn supports_sse(&self) -> bool {
        matches!(self, Arch::X86 | Arch::X86_64)
    }
}

impl FromStr for Arch {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" => Arch::X86,
            "x86_64" | "amd64" | "x64" => Arch::X86_64,
            "armv7" | "arm" => Arch::Armv7,
            "arm64" | "aarch64" | "armv8" => Arch::Arm64,
            other => Arch::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerFamily {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
}

impl CompilerFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang => "clang",
            CompilerFamily::AppleClang => "apple-clang",
            CompilerFamily::Msvc => "msvc",
        }
    }
}

impl FromStr for CompilerFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcc" | "g++" | "gnu" => Ok(CompilerFamily::Gcc),
            "clang" | "llvm" => Ok(CompilerFamily::Clang),
            "apple-clang" | "appleclang" => Ok(CompilerFamily::AppleClang),
            "msvc" | "cl" | "visual studio" | "vs" => Ok(CompilerFamily::Msvc),
            _ => Err(format!(
                "unknown compiler '{}'; expected 'gcc', 'clang', 'apple-clang', or 'msvc'",
                s
            )),
        }
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerIdentity {
    /// Compiler family (gcc, clang, msvc)
    pub family: CompilerFamily,
    /// Compiler version
    pub version: String,
}

impl CompilerIdentity {
    pub fn new(family: CompilerFamily, version: impl Into<String>) -> Self {
        CompilerIdentity {
            family,
            version: version.into(),
        }
    }

    pub fn is_msvc(&self) -> bool {
        self.family == CompilerFamily::Msvc
    }
}

impl fmt::Display for CompilerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.family, self.version)
    }
}

/// Shared vs static build of the packaged library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Shared,
    Static,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Shared => "shared",
            Variant::Static => "static",
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Variant::Shared)
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Variant::Static)
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" | "dynamic" => Ok(Variant::Shared),
            "static" => Ok(Variant::Static),
            _ => Err(format!(
                "invalid variant '{}'; expected 'shared' or 'static'",
                s
            )),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CMake build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildType {
    #[default]
    Release,
    Debug,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Release => "Release",
            BuildType::Debug => "Debug",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(BuildType::Release),
            "debug" => Ok(BuildType::Debug),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            "minsizerel" => Ok(BuildType::MinSizeRel),
            _ => Err(format!(
                "invalid build type '{}'; expected Release, Debug, RelWithDebInfo or MinSizeRel",
                s
            )),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything about the target that influences a packaging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    pub platform: Platform,
    pub arch: Arch,
    pub compiler: CompilerIdentity,
    pub variant: Variant,
    pub build_type: BuildType,
    /// Declared C++ standard, if the consumer pinned one
    pub cppstd: Option<CppStandard>,
    /// Directory holding dependency find-modules for CMake
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_path: Option<PathBuf>,
}

impl BuildContext {
    /// Create a context with release build type and no C++ standard pinned.
    pub fn new(platform: Platform, arch: Arch, compiler: CompilerIdentity, variant: Variant) -> Self {
        BuildContext {
            platform,
            arch,
            compiler,
            variant,
            build_type: BuildType::default(),
            cppstd: None,
            module_path: None,
        }
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn with_cppstd(mut self, cppstd: CppStandard) -> Self {
        self.cppstd = Some(cppstd);
        self
    }

    pub fn with_module_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_path = Some(path.into());
        self
    }

    /// Whether this is a static build with the MSVC toolchain.
    pub fn is_msvc_static(&self) -> bool {
        self.compiler.is_msvc() && self.variant.is_static()
    }

    /// Reject contexts the recipe cannot build.
    pub fn validate(&self, min_cppstd: CppStandard) -> Result<()> {
        if let Some(std) = self.cppstd {
            if std < min_cppstd {
                return Err(PackageError::InvalidContext {
                    message: format!(
                        "{} is required, but the context declares {}",
                        min_cppstd, std
                    ),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} {} {} {}",
            self.platform, self.arch, self.compiler, self.variant, self.build_type
        )
    }
}
