//! Declarative option model with per-context applicability.
//!
//! Each option declares its allowed values, a default, and an
//! applicability rule over (platform, architecture, variant). Resolution
//! against a `BuildContext` yields a `ResolvedOptions` set that simply
//! does not contain inapplicable options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::context::{Arch, BuildContext, Platform, Variant};
use crate::core::errors::PackageError;

/// An option value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Str(_) => None,
        }
    }

    /// Parse a command-line value. `true/false/on/off/yes/no/1/0` are booleans.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => OptionValue::Bool(true),
            "false" | "off" | "no" | "0" => OptionValue::Bool(false),
            _ => OptionValue::Str(s.to_string()),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

/// When an option exists for a context.
///
/// All populated constraints must hold. An empty rule always applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Applicability {
    /// Platforms on which the option does not exist
    pub exclude_platforms: Vec<Platform>,
    /// If non-empty, the only architectures on which the option exists
    pub only_archs: Vec<Arch>,
    /// Variants for which the option does not exist
    pub exclude_variants: Vec<Variant>,
}

impl Applicability {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn exclude_platform(mut self, platform: Platform) -> Self {
        self.exclude_platforms.push(platform);
        self
    }

    pub fn only_arch(mut self, arch: Arch) -> Self {
        self.only_archs.push(arch);
        self
    }

    pub fn exclude_variant(mut self, variant: Variant) -> Self {
        self.exclude_variants.push(variant);
        self
    }

    /// Evaluate the rule; on failure, say why.
    pub fn check(&self, ctx: &BuildContext) -> std::result::Result<(), String> {
        if self.exclude_platforms.contains(&ctx.platform) {
            return Err(format!("not available on {}", ctx.platform));
        }
        if !self.only_archs.is_empty() && !self.only_archs.contains(&ctx.arch) {
            return Err(format!("not available on {}", ctx.arch));
        }
        if self.exclude_variants.contains(&ctx.variant) {
            return Err(format!("not available for {} builds", ctx.variant));
        }
        Ok(())
    }

    pub fn applies(&self, ctx: &BuildContext) -> bool {
        self.check(ctx).is_ok()
    }
}

/// A declared option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDecl {
    pub name: String,
    pub allowed: Vec<OptionValue>,
    pub default: OptionValue,
    #[serde(default)]
    pub applicability: Applicability,
    /// Build configuration key this option feeds, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,
}

impl OptionDecl {
    /// A boolean option applicable everywhere.
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        OptionDecl {
            name: name.into(),
            allowed: vec![OptionValue::Bool(true), OptionValue::Bool(false)],
            default: OptionValue::Bool(default),
            applicability: Applicability::always(),
            config_key: None,
        }
    }

    pub fn applicable_when(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }

    pub fn config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = Some(key.into());
        self
    }

    fn allowed_list(&self) -> String {
        self.allowed
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A user-supplied `name=value` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionOverride {
    pub name: String,
    pub value: OptionValue,
}

impl FromStr for OptionOverride {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("invalid option override '{}'; expected name=value", s))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("invalid option override '{}'; empty name", s));
        }
        Ok(OptionOverride {
            name: name.to_string(),
            value: OptionValue::parse(value.trim()),
        })
    }
}

/// The declared option set of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionModel {
    options: Vec<OptionDecl>,
}

impl OptionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, decl: OptionDecl) -> Self {
        self.options.push(decl);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionDecl> {
        self.options.iter()
    }

    /// Resolve every option for `ctx`, applying `overrides`.
    ///
    /// Inapplicable options are omitted. Overriding one is a
    /// `ConfigurationConflict`.
    pub fn resolve(&self, ctx: &BuildContext, overrides: &[OptionOverride]) -> Result<ResolvedOptions> {
        for ov in overrides {
            let Some(decl) = self.get(&ov.name) else {
                let known = self
                    .options
                    .iter()
                    .map(|o| o.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(PackageError::UnknownOption {
                    option: ov.name.clone(),
                    known: Some(format!("known options: {}", known)),
                }
                .into());
            };

            if !decl.allowed.contains(&ov.value) {
                return Err(PackageError::InvalidOptionValue {
                    option: ov.name.clone(),
                    value: ov.value.to_string(),
                    allowed: decl.allowed_list(),
                }
                .into());
            }

            if let Err(reason) = decl.applicability.check(ctx) {
                return Err(PackageError::ConfigurationConflict {
                    option: ov.name.clone(),
                    reason,
                }
                .into());
            }
        }

        let mut values = BTreeMap::new();
        for decl in &self.options {
            if !decl.applicability.applies(ctx) {
                tracing::debug!("option `{}` not applicable to {}", decl.name, ctx);
                continue;
            }

            // Last override wins
            let value = overrides
                .iter()
                .rev()
                .find(|ov| ov.name == decl.name)
                .map(|ov| ov.value.clone())
                .unwrap_or_else(|| decl.default.clone());

            values.insert(decl.name.clone(), value);
        }

        Ok(ResolvedOptions { values })
    }
}

/// Options applicable to one build context, with their final values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedOptions {
    values: BTreeMap<String, OptionValue>,
}

impl ResolvedOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
