// src/requirements.rs

//! Dependency declarations
//!
//! A recipe lists the packages it links against (`requires`) and the tools
//! it needs only while building (`tool_requires`). Both are handed to the
//! host resolver as declared; no version arbitration happens here.
//!
//! References use the `name/version[@namespace]` form, e.g.
//! `math/ee8b6fb1ed@adnn` or `glfw/3.4`. Tool references carry a range:
//! `cmake/[>=3.23]`.

use crate::error::{ConfigError, Result};
use semver::{Version, VersionReq};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// One required package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: String,
    /// Version number or source revision
    pub version: String,
    /// Owning namespace (`@user`), if any
    pub namespace: Option<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Parse `name/version[@namespace]`
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = |reason: &str| ConfigError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let reference_trimmed = reference.trim();
        let (body, namespace) = match reference_trimmed.split_once('@') {
            Some((body, ns)) => {
                if ns.is_empty() || ns.contains('/') || ns.contains('@') {
                    return Err(invalid("namespace must be a single non-empty word").into());
                }
                (body, Some(ns.to_string()))
            }
            None => (reference_trimmed, None),
        };

        let (name, version) = body
            .split_once('/')
            .ok_or_else(|| invalid("expected name/version"))?;

        if !is_valid_name(name) {
            return Err(invalid("package name may only contain letters, digits, '-', '_', '.' and '+'").into());
        }
        if version.is_empty() || version.contains('/') {
            return Err(invalid("version must be a single non-empty component").into());
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            namespace,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(ns) = &self.namespace {
            write!(f, "@{}", ns)?;
        }
        Ok(())
    }
}

impl FromStr for Requirement {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
}

/// Ordered list of requirements with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    items: Vec<Requirement>,
}

impl Requirements {
    /// Build the list, rejecting a second entry for the same package
    pub fn new(items: Vec<Requirement>) -> Result<Self> {
        for (i, req) in items.iter().enumerate() {
            if items[..i].iter().any(|r| r.name == req.name) {
                return Err(ConfigError::DuplicateRequirement(req.name.clone()).into());
            }
        }
        Ok(Self { items })
    }

    pub fn parse<S: AsRef<str>>(references: &[S]) -> Result<Self> {
        let items = references
            .iter()
            .map(|r| Requirement::parse(r.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(items)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Requirement] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.items.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A build-environment tool with an accepted version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    pub name: String,
    pub range: VersionReq,
}

impl ToolRequirement {
    /// Parse `name/[range]` or `name/version` (exact match)
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = |reason: String| ConfigError::InvalidReference {
            reference: reference.to_string(),
            reason,
        };

        let (name, spec) = reference
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid("expected name/[range]".to_string()))?;

        if !is_valid_name(name) {
            return Err(invalid("invalid tool name".to_string()).into());
        }

        let req_text = match spec.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(range) => range.replace(' ', ", ").replace(",,", ","),
            None => format!("={}", spec),
        };

        let range = VersionReq::parse(&req_text).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            range,
        })
    }

    /// Whether a reported tool version falls in the range
    ///
    /// Tools often report two-component versions (`3.28`); those are
    /// padded with zeros before comparison.
    pub fn satisfied_by(&self, version: &str) -> bool {
        normalize_version(version).is_some_and(|v| self.range.matches(&v))
    }
}

impl fmt::Display for ToolRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/[{}]", self.name, self.range)
    }
}

impl<'de> Deserialize<'de> for ToolRequirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn normalize_version(version: &str) -> Option<Version> {
    let core: &str = version
        .trim()
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .next()
        .unwrap_or("");
    let mut parts: Vec<&str> = core.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&parts.join(".")).ok()
}
