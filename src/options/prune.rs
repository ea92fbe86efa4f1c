// src/options/prune.rs

//! Pruning rules shared by recipes
//!
//! Each rule is a pure function from an option set to a new one, so a
//! recipe composes the rules it wants in its `config_options` and
//! `configure` hooks. Applying a rule twice gives the same result as
//! applying it once.

use super::OptionSet;
use crate::settings::Settings;

/// Position-independent code has no meaning for Windows targets
pub fn remove_fpic_on_windows(settings: &Settings, options: &OptionSet) -> OptionSet {
    if settings.is_windows() {
        options.remove("fPIC")
    } else {
        options.clone()
    }
}

/// Shared libraries are always PIC, the option would only dangle
pub fn remove_fpic_when_shared(options: &OptionSet) -> OptionSet {
    if options.is_true("shared") {
        options.remove("fPIC")
    } else {
        options.clone()
    }
}

/// Both standard rules, in order
pub fn prune(settings: &Settings, options: &OptionSet) -> OptionSet {
    let options = remove_fpic_on_windows(settings, options);
    remove_fpic_when_shared(&options)
}
