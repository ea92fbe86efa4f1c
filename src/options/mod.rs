// src/options/mod.rs

//! Recipe options and pruning
//!
//! Options are recipe-local knobs (`shared`, `fPIC`, `visibility`). Each
//! declared option lives in an [`OptionSlot`] which is either present with a
//! value or absent because pruning removed it. An absent option is not the
//! same as `False`: reading it with [`OptionSet::get`] fails, and only
//! [`OptionSet::get_safe`] treats it as "not applicable".
//!
//! Every transformation returns a new `OptionSet`; nothing mutates a set
//! another stage may still be reading.

mod prune;
mod value;

pub use prune::{prune, remove_fpic_on_windows, remove_fpic_when_shared};
pub use value::{OptionDecl, OptionValue};

use crate::error::{ConfigError, Error, Result};
use std::fmt;
use tracing::{debug, warn};

/// State of one declared option for the current evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSlot {
    Present(OptionValue),
    Absent,
}

impl OptionSlot {
    pub fn value(&self) -> Option<&OptionValue> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    decl: OptionDecl,
    slot: OptionSlot,
}

/// Declared options with their current values
///
/// Entries keep the order of the declarations given to `from_decls`;
/// recipe options arrive sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<Entry>,
}

impl OptionSet {
    /// Start every declared option at its default
    pub fn from_decls(decls: &[OptionDecl]) -> Result<Self> {
        let mut entries: Vec<Entry> = Vec::with_capacity(decls.len());

        for decl in decls {
            if entries.iter().any(|e| e.decl.name == decl.name) {
                return Err(Error::Parse(format!(
                    "option '{}' is declared more than once",
                    decl.name
                )));
            }
            if !decl.accepts(&decl.default) {
                return Err(decl.rejection(&decl.default).into());
            }
            entries.push(Entry {
                decl: decl.clone(),
                slot: OptionSlot::Present(decl.default.clone()),
            });
        }

        Ok(Self { entries })
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.decl.name == name)
    }

    /// Read a present option
    ///
    /// Fails with `OptionAbsent` if the option was pruned and with
    /// `UnknownOption` if it was never declared.
    pub fn get(&self, name: &str) -> std::result::Result<&OptionValue, ConfigError> {
        match self.entry(name) {
            None => Err(ConfigError::UnknownOption(name.to_string())),
            Some(Entry {
                slot: OptionSlot::Present(v),
                ..
            }) => Ok(v),
            Some(Entry {
                slot: OptionSlot::Absent,
                ..
            }) => Err(ConfigError::OptionAbsent(name.to_string())),
        }
    }

    /// Read an option that may have been pruned or never declared
    pub fn get_safe(&self, name: &str) -> Option<&OptionValue> {
        self.entry(name).and_then(|e| e.slot.value())
    }

    pub fn slot(&self, name: &str) -> Option<&OptionSlot> {
        self.entry(name).map(|e| &e.slot)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get_safe(name).is_some()
    }

    /// True only for a present boolean option set to `True`
    pub fn is_true(&self, name: &str) -> bool {
        self.get_safe(name).and_then(OptionValue::as_bool) == Some(true)
    }

    /// Present options as `(name, value)`, in entry order
    pub fn present(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries
            .iter()
            .filter_map(|e| e.slot.value().map(|v| (e.decl.name.as_str(), v)))
    }

    /// Names of options pruned for this evaluation
    pub fn absent(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.slot.is_present())
            .map(|e| e.decl.name.as_str())
    }

    pub fn decls(&self) -> impl Iterator<Item = &OptionDecl> {
        self.entries.iter().map(|e| &e.decl)
    }

    /// Apply user-supplied `name=value` assignments
    ///
    /// Unknown names and values outside the domain are errors. An
    /// assignment to an option that is already absent is dropped: the
    /// removal made for these settings wins over any requested value.
    pub fn with_overrides<K, V>(&self, overrides: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut next = self.clone();

        for (name, raw) in overrides {
            let name = name.as_ref();
            let entry = next
                .entries
                .iter_mut()
                .find(|e| e.decl.name == name)
                .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?;

            let value = entry.decl.parse_value(raw.as_ref())?;
            if entry.slot.is_present() {
                entry.slot = OptionSlot::Present(value);
            } else {
                debug!("Ignoring override {}={}: option was removed", name, value);
            }
        }

        Ok(next)
    }

    /// Remove an option for this evaluation
    ///
    /// Removing an undeclared or already-absent option is a no-op. Options
    /// not declared removable are kept.
    pub fn remove(&self, name: &str) -> Self {
        let mut next = self.clone();
        if let Some(entry) = next.entries.iter_mut().find(|e| e.decl.name == name) {
            if !entry.decl.removable {
                warn!("Option '{}' is not removable; keeping it", name);
            } else if entry.slot.is_present() {
                debug!("Removing option '{}'", name);
                entry.slot = OptionSlot::Absent;
            }
        }
        next
    }

    /// Check that every present value is inside its domain
    pub fn check_domains(&self) -> std::result::Result<(), ConfigError> {
        for entry in &self.entries {
            if let OptionSlot::Present(v) = &entry.slot
                && !entry.decl.accepts(v)
            {
                return Err(entry.decl.rejection(v));
            }
        }
        Ok(())
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .present()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
