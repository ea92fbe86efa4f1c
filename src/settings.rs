// src/settings.rs

//! Platform settings supplied by the host
//!
//! Settings are fixed facts about the target platform (`os`, `arch`,
//! `compiler`, `compiler.cppstd`, `build_type`). A recipe reads them but
//! never changes them, so `Settings` has no mutating methods once built.

use crate::error::{ConfigError, Error, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Immutable key/value view of the target platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Settings with no values at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build settings from `(key, value)` pairs; later pairs win
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse `key=value` assignments as given with `-s` on the command line
    pub fn parse_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self> {
        let pairs = assignments
            .iter()
            .map(|a| parse_assignment(a.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_pairs(pairs))
    }

    /// Combine two settings maps, values in `overrides` taking precedence
    pub fn merged(&self, overrides: &Settings) -> Settings {
        let mut values = self.values.clone();
        for (k, v) in &overrides.values {
            values.insert(k.clone(), v.clone());
        }
        Settings { values }
    }

    /// Settings describing the machine this process runs on
    pub fn host() -> Self {
        Self::from_pairs([
            ("os", host_os()),
            ("arch", host_arch()),
        ])
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn os(&self) -> Option<&str> {
        self.get("os")
    }

    pub fn arch(&self) -> Option<&str> {
        self.get("arch")
    }

    pub fn build_type(&self) -> Option<&str> {
        self.get("build_type")
    }

    pub fn compiler(&self) -> Option<&str> {
        self.get("compiler")
    }

    pub fn is_windows(&self) -> bool {
        self.os() == Some("Windows")
    }

    /// The C++ standard, if the settings expose one
    pub fn cppstd(&self) -> Result<Option<CppStd>> {
        self.get("compiler.cppstd").map(CppStd::parse).transpose()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Split a `key=value` assignment
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    let (key, value) = s.split_once('=').ok_or_else(|| {
        Error::Config(ConfigError::InvalidSetting {
            key: s.to_string(),
            reason: "expected key=value".to_string(),
        })
    })?;

    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidSetting {
            key: s.to_string(),
            reason: "empty key".to_string(),
        }
        .into());
    }

    Ok((key.to_string(), value.to_string()))
}

/// Map the Rust target OS name onto the names recipes use
fn host_os() -> &'static str {
    match std::env::consts::OS {
        "windows" => "Windows",
        "macos" => "Macos",
        "freebsd" => "FreeBSD",
        "android" => "Android",
        "ios" => "iOS",
        _ => "Linux",
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x86_64",
        "x86" => "x86",
        "aarch64" => "armv8",
        "arm" => "armv7",
        "riscv64" => "riscv64",
        other => other,
    }
}

/// A C++ language standard such as `17` or `gnu20`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CppStd {
    year: u16,
    gnu: bool,
}

impl CppStd {
    /// Parse `98`, `03`, `11` ... `26`, optionally prefixed with `gnu`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (gnu, digits) = match s.strip_prefix("gnu") {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let short: u16 = digits.parse().map_err(|_| ConfigError::InvalidSetting {
            key: "compiler.cppstd".to_string(),
            reason: format!("'{}' is not a C++ standard", s),
        })?;

        let year = match short {
            98 => 1998,
            n if n < 98 => 2000 + n,
            n => {
                return Err(ConfigError::InvalidSetting {
                    key: "compiler.cppstd".to_string(),
                    reason: format!("'{}' is not a C++ standard", n),
                }
                .into());
            }
        };

        Ok(Self { year, gnu })
    }

    /// Two-digit form used by CMake (`CMAKE_CXX_STANDARD`)
    pub fn short(&self) -> u16 {
        self.year % 100
    }

    /// Whether GNU extensions are requested
    pub fn is_gnu(&self) -> bool {
        self.gnu
    }
}

impl PartialOrd for CppStd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CppStd {
    // Extensions do not change the language level
    fn cmp(&self, other: &Self) -> Ordering {
        self.year.cmp(&other.year)
    }
}

impl fmt::Display for CppStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gnu {
            write!(f, "gnu{:02}", self.short())
        } else {
            write!(f, "{:02}", self.short())
        }
    }
}

/// A host profile file
///
/// Profiles use the same sectioned `key=value` layout as the command line:
///
/// ```text
/// [settings]
/// os=Linux
/// compiler=gcc
/// compiler.cppstd=20
///
/// [options]
/// shared=True
///
/// [conf]
/// tools.build.cross_building:can_run=False
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileFile {
    pub settings: Settings,
    pub options: Vec<(String, String)>,
    pub conf: BTreeMap<String, String>,
}

impl ProfileFile {
    pub fn parse(content: &str) -> Result<Self> {
        let mut settings = Vec::new();
        let mut options = Vec::new();
        let mut conf = BTreeMap::new();
        let mut section: Option<String> = None;

        for (lineno, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                section = Some(line[1..line.len() - 1].trim().to_string());
                continue;
            }

            let (key, value) = parse_assignment(line)
                .map_err(|e| Error::Parse(format!("profile line {}: {}", lineno + 1, e)))?;

            match section.as_deref() {
                Some("settings") => settings.push((key, value)),
                Some("options") => options.push((key, value)),
                Some("conf") => {
                    conf.insert(key, value);
                }
                Some(other) => {
                    return Err(Error::Parse(format!(
                        "profile line {}: unknown section [{}]",
                        lineno + 1,
                        other
                    )));
                }
                None => {
                    return Err(Error::Parse(format!(
                        "profile line {}: assignment outside of a section",
                        lineno + 1
                    )));
                }
            }
        }

        Ok(Self {
            settings: Settings::from_pairs(settings),
            options,
            conf,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Read a boolean `[conf]` entry (`True`/`False`, case-insensitive)
    pub fn conf_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.conf.get(key) {
            None => Ok(None),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(Error::Parse(format!("conf {} expects a boolean, got '{}'", key, v))),
            },
        }
    }
}
