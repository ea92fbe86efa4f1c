// src/engine/stage.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stages, in the order they complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Instantiated,
    OptionsPruned,
    Validated,
    LayoutComputed,
    Exported,
    Sourced,
    Built,
    Packaged,
    InfoPublished,
}

impl Stage {
    /// Stage that must have completed before this one may run
    ///
    /// `Exported` is optional: sourcing only needs the layout.
    pub fn requires(self) -> Option<Stage> {
        match self {
            Self::Instantiated => None,
            Self::OptionsPruned => Some(Self::Instantiated),
            Self::Validated => Some(Self::OptionsPruned),
            Self::LayoutComputed => Some(Self::Validated),
            Self::Exported | Self::Sourced => Some(Self::LayoutComputed),
            Self::Built => Some(Self::Sourced),
            Self::Packaged => Some(Self::Built),
            Self::InfoPublished => Some(Self::Packaged),
        }
    }

    /// Whether completion survives the process (recorded in the journal)
    pub fn is_persistent(self) -> bool {
        self >= Self::Sourced
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instantiated => "instantiated",
            Self::OptionsPruned => "options_pruned",
            Self::Validated => "validated",
            Self::LayoutComputed => "layout_computed",
            Self::Exported => "exported",
            Self::Sourced => "sourced",
            Self::Built => "built",
            Self::Packaged => "packaged",
            Self::InfoPublished => "info_published",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
