//! Host compiler detection.
//!
//! Berth never drives the compiler itself; CMake does. Detection only
//! fills in the compiler identity of the build context when the user did
//! not pin one.

use std::path::Path;

use crate::core::context::{CompilerFamily, CompilerIdentity, Platform};
use crate::util::process::{find_cxx_compiler, ProcessBuilder};

/// Detect the host C++ compiler.
///
/// Looks at `CXX`, then `CC`, then the usual compiler names on PATH.
/// Returns `None` when nothing is found.
pub fn detect_host_compiler() -> Option<CompilerIdentity> {
    let cxx = find_cxx_compiler()?;
    let output = version_output(&cxx);
    let family = detect_compiler_family(&cxx, &output);
    let version = parse_compiler_version(&output).unwrap_or_else(|| "unknown".to_string());

    tracing::debug!("detected compiler {} {} at {}", family, version, cxx.display());
    Some(CompilerIdentity::new(family, version))
}

/// The compiler a platform conventionally uses, for when none is detected.
pub fn default_compiler_for(platform: &Platform) -> CompilerIdentity {
    let family = match platform {
        Platform::Windows => CompilerFamily::Msvc,
        Platform::Macos => CompilerFamily::AppleClang,
        Platform::Freebsd => CompilerFamily::Clang,
        _ => CompilerFamily::Gcc,
    };
    CompilerIdentity::new(family, "unknown")
}

/// Combined stdout and stderr of `<cc> --version`.
///
/// `cl` rejects `--version` and prints its banner to stderr, which still
/// carries the version.
fn version_output(cc: &Path) -> String {
    let is_cl = cc
        .file_stem()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case("cl"))
        .unwrap_or(false);

    let pb = if is_cl {
        ProcessBuilder::new(cc)
    } else {
        ProcessBuilder::new(cc).arg("--version")
    };

    match pb.exec() {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            text
        }
        Err(e) => {
            tracing::debug!("failed to query {} version: {:#}", cc.display(), e);
            String::new()
        }
    }
}

/// Detect compiler family from its binary name, falling back to the
/// `--version` output.
pub fn detect_compiler_family(cc: &Path, version_output: &str) -> CompilerFamily {
    // Check binary name first
    let name = cc
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    let output = version_output.to_lowercase();

    if name == "cl" || name == "clang-cl" || output.contains("microsoft") {
        return CompilerFamily::Msvc;
    }
    if name.contains("clang") || output.contains("clang") {
        // Could be Apple Clang or regular Clang
        if output.contains("apple") {
            return CompilerFamily::AppleClang;
        }
        return CompilerFamily::Clang;
    }

    // Default to GCC
    CompilerFamily::Gcc
}

/// First dotted number in compiler version output (e.g. `13.2.0`).
pub fn parse_compiler_version(output: &str) -> Option<String> {
    for line in output.lines() {
        for word in line.split(|c: char| c.is_whitespace() || c == '(' || c == ')') {
            let word = word.trim_end_matches(|c: char| !c.is_ascii_digit());
            if !word.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            let parts: Vec<&str> = word.split('.').collect();
            if parts.len() >= 2 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
                return Some(word.to_string());
            }
        }
    }
    None
}
