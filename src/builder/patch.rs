//! Textual source patching.
//!
//! A patch rule is an exact find-and-replace over the files a glob matches
//! under the source root. Rules run in declaration order, so later rules
//! see the effects of earlier ones.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::errors::PackageError;
use crate::util::fs::{glob_files, read_to_string, relative_path, slash_path};

/// A declarative find-and-replace instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRule {
    /// Short name used in reports and errors
    pub name: String,
    /// Glob relative to the source root
    pub pattern: String,
    /// Exact text to find
    pub search: String,
    /// Replacement text
    pub replace: String,
    /// Whether a missing file or search string is an error
    pub required: bool,
}

impl PatchRule {
    /// A required-match rule.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        search: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        PatchRule {
            name: name.into(),
            pattern: pattern.into(),
            search: search.into(),
            replace: replace.into(),
            required: true,
        }
    }

    /// Make the rule tolerate a missing file or search string.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Replace every occurrence of the search string.
    ///
    /// Returns the new content and the number of occurrences replaced.
    pub fn apply_to_str(&self, content: &str) -> (String, usize) {
        if self.search.is_empty() {
            return (content.to_string(), 0);
        }
        let count = content.matches(self.search.as_str()).count();
        if count == 0 {
            return (content.to_string(), 0);
        }
        (content.replace(self.search.as_str(), &self.replace), count)
    }
}

/// What one rule did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    /// Files the glob matched, relative to the source root
    pub matched: Vec<PathBuf>,
    /// Files that were rewritten
    pub changed: Vec<PathBuf>,
    /// Total occurrences replaced
    pub replacements: usize,
}

/// What a patch run did, per rule, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub rules: Vec<RuleReport>,
}

impl PatchReport {
    pub fn files_changed(&self) -> usize {
        self.rules.iter().map(|r| r.changed.len()).sum()
    }

    pub fn replacements(&self) -> usize {
        self.rules.iter().map(|r| r.replacements).sum()
    }

    pub fn get(&self, rule: &str) -> Option<&RuleReport> {
        self.rules.iter().find(|r| r.rule == rule)
    }
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules, {} files changed, {} replacements",
            self.rules.len(),
            self.files_changed(),
            self.replacements()
        )
    }
}

/// Apply `rules` in order to the tree at `source_root`.
///
/// Files are written back only when their content changed. A required
/// rule fails with `PatchTargetNotFound` when its glob matches nothing or a
/// matched file lacks the search string. Earlier rules' edits are not
/// rolled back on failure.
pub fn apply_patches(rules: &[PatchRule], source_root: &Path) -> Result<PatchReport> {
    let mut report = PatchReport::default();

    for rule in rules {
        let files = glob_files(source_root, &rule.pattern)?;
        let mut rule_report = RuleReport {
            rule: rule.name.clone(),
            ..Default::default()
        };

        if files.is_empty() {
            if rule.required {
                return Err(PackageError::PatchTargetNotFound {
                    rule: rule.name.clone(),
                    file: rule.pattern.clone(),
                }
                .into());
            }
            tracing::debug!("patch `{}`: no file matches `{}`, skipping", rule.name, rule.pattern);
            report.rules.push(rule_report);
            continue;
        }

        for file in files {
            let rel = relative_path(source_root, &file);
            let content = read_to_string(&file)?;
            let (patched, count) = rule.apply_to_str(&content);

            if count == 0 {
                if rule.required {
                    return Err(PackageError::PatchTargetNotFound {
                        rule: rule.name.clone(),
                        file: slash_path(&rel),
                    }
                    .into());
                }
                tracing::debug!("patch `{}`: search string absent in {}, skipping", rule.name, rel.display());
                rule_report.matched.push(rel);
                continue;
            }

            if patched != content {
                std::fs::write(&file, &patched)
                    .with_context(|| format!("failed to write patched file: {}", file.display()))?;
                rule_report.changed.push(rel.clone());
            }
            rule_report.replacements += count;
            rule_report.matched.push(rel);
        }

        tracing::info!(
            "patch `{}`: {} replacements in {} files",
            rule.name,
            rule_report.replacements,
            rule_report.changed.len()
        );
        report.rules.push(rule_report);
    }

    Ok(report)
}
