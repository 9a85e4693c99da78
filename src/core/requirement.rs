//! Pinned requirement references: `name/version[@qualifier]`.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A pinned package requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub version: String,
    /// Optional channel qualifier (the part after `@`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Requirement {
            name: name.into(),
            version: version.into(),
            channel: None,
        }
    }
}

/// Parse a version, accepting `1.2` as `1.2.0`.
pub fn parse_lenient_version(s: &str) -> Result<semver::Version> {
    let padded = match s.split('.').count() {
        1 => format!("{}.0.0", s),
        2 => format!("{}.0", s),
        _ => s.to_string(),
    };
    semver::Version::parse(&padded).map_err(|e| anyhow::anyhow!("invalid version '{}': {}", s, e))
}

impl FromStr for Requirement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (reference, channel) = match s.split_once('@') {
            Some((r, c)) if !c.is_empty() => (r, Some(c.to_string())),
            Some(_) => bail!("empty qualifier in requirement '{}'", s),
            None => (s, None),
        };

        let Some((name, version)) = reference.split_once('/') else {
            bail!("requirement '{}' is not of the form name/version", s);
        };

        if name.is_empty() || version.is_empty() || version.contains('/') {
            bail!("requirement '{}' is not of the form name/version", s);
        }

        Ok(Requirement {
            name: name.to_string(),
            version: version.to_string(),
            channel,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(channel) = &self.channel {
            write!(f, "@{}", channel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirement() {
        let req: Requirement = "expat/2.4.8".parse().unwrap();
        assert_eq!(req, Requirement::new("expat", "2.4.8"));
        assert_eq!(req.to_string(), "expat/2.4.8");

        let req: Requirement = "openexr/3.1.5@studio/stable".parse().unwrap();
        assert_eq!(req.channel.as_deref(), Some("studio/stable"));
        assert_eq!(req.to_string(), "openexr/3.1.5@studio/stable");
    }

    #[test]
    fn test_parse_requirement_errors() {
        assert!("expat".parse::<Requirement>().is_err());
        assert!("/1.0".parse::<Requirement>().is_err());
        assert!("expat/".parse::<Requirement>().is_err());
        assert!("expat/1.0@".parse::<Requirement>().is_err());
    }

    #[test]
    fn test_lenient_version() {
        assert_eq!(parse_lenient_version("2.1").unwrap(), semver::Version::new(2, 1, 0));
        assert_eq!(parse_lenient_version("2").unwrap(), semver::Version::new(2, 0, 0));
        assert!(parse_lenient_version("2.1.0").unwrap() >= semver::Version::new(2, 1, 0));
        assert!(parse_lenient_version("two").is_err());
    }
}
