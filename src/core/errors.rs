//! Packaging error taxonomy.
//!
//! Every pipeline stage fails fast with one of these. Library functions
//! return `anyhow::Result`, so callers recover the typed error with
//! `err.downcast_ref::<PackageError>()`.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error raised by a packaging stage.
#[derive(Debug, Error, Diagnostic)]
pub enum PackageError {
    #[error("failed to fetch `{url}`: {message}")]
    #[diagnostic(
        code(berth::fetch),
        help("Discard the work directory and retry; check the URL and network access")
    )]
    Fetch { url: String, message: String },

    #[error("patch `{rule}` found no occurrence in `{file}`")]
    #[diagnostic(
        code(berth::patch::target_not_found),
        help("The upstream snapshot no longer matches this patch; update the rule or the pinned version")
    )]
    PatchTargetNotFound { rule: String, file: String },

    #[error("option `{option}` cannot be set: {reason}")]
    #[diagnostic(
        code(berth::options::conflict),
        help("Remove the override; the option does not exist for this platform, architecture or variant")
    )]
    ConfigurationConflict { option: String, reason: String },

    #[error("unknown option `{option}`")]
    #[diagnostic(code(berth::options::unknown))]
    UnknownOption {
        option: String,
        #[help]
        known: Option<String>,
    },

    #[error("invalid value `{value}` for option `{option}` (allowed: {allowed})")]
    #[diagnostic(code(berth::options::invalid_value))]
    InvalidOptionValue {
        option: String,
        value: String,
        allowed: String,
    },

    #[error("invalid build context: {message}")]
    #[diagnostic(code(berth::context::invalid))]
    InvalidContext { message: String },

    #[error("{phase} step failed{}", exit_suffix(.status))]
    #[diagnostic(
        code(berth::build::invocation),
        help("The captured output is printed above; the build tree is left in place for debugging")
    )]
    BuildInvocation {
        phase: String,
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("install tree is not normalizable: {message} ({})", .path.display())]
    #[diagnostic(code(berth::install::normalization))]
    Normalization { path: PathBuf, message: String },
}

fn exit_suffix(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl PackageError {
    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        PackageError::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a normalization error for a path.
    pub fn normalization(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PackageError::Normalization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Exit status of the external process, if this is a build failure.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            PackageError::BuildInvocation { status, .. } => *status,
            _ => None,
        }
    }
}
