// src/options/value.rs

//! Option values and declarations

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value of a recipe option
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Bool(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Declaration of one option: its allowed values and default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    pub name: String,
    pub domain: Vec<OptionValue>,
    pub default: OptionValue,
    /// Whether pruning may remove this option
    pub removable: bool,
}

impl OptionDecl {
    /// A `True`/`False` option
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            domain: vec![OptionValue::Bool(true), OptionValue::Bool(false)],
            default: OptionValue::Bool(default),
            removable: false,
        }
    }

    /// An option restricted to a fixed set of words
    pub fn choice(name: impl Into<String>, values: &[&str], default: &str) -> Self {
        Self {
            name: name.into(),
            domain: values.iter().map(|v| OptionValue::from(*v)).collect(),
            default: OptionValue::from(default),
            removable: false,
        }
    }

    pub fn removable(mut self) -> Self {
        self.removable = true;
        self
    }

    pub fn accepts(&self, value: &OptionValue) -> bool {
        self.domain.contains(value)
    }

    fn is_boolean(&self) -> bool {
        self.domain.iter().any(|v| matches!(v, OptionValue::Bool(_)))
    }

    /// Parse a command-line value and check it against the domain
    pub fn parse_value(&self, raw: &str) -> Result<OptionValue> {
        let raw = raw.trim();
        let value = if self.is_boolean() {
            match raw.to_ascii_lowercase().as_str() {
                "true" => OptionValue::Bool(true),
                "false" => OptionValue::Bool(false),
                _ => OptionValue::Text(raw.to_string()),
            }
        } else {
            OptionValue::Text(raw.to_string())
        };

        if !self.accepts(&value) {
            return Err(self.rejection(&value).into());
        }
        Ok(value)
    }

    pub(crate) fn rejection(&self, value: &OptionValue) -> ConfigError {
        ConfigError::InvalidOptionValue {
            name: self.name.clone(),
            value: value.to_string(),
            allowed: self.allowed(),
        }
    }

    /// Comma separated list of allowed values
    pub fn allowed(&self) -> String {
        self.domain
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
