// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files holding plain data. Behaviour lives in
//! [`crate::recipe::hooks`], never in the recipe itself.

use crate::error::Result;
use crate::options::{OptionDecl, OptionSet, OptionValue};
use crate::requirements::{Requirement, Requirements, ToolRequirement};
use crate::settings::CppStd;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A complete recipe
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Setting names the recipe reads (`os`, `compiler`, `build_type`, `arch`)
    #[serde(default)]
    pub settings: Vec<String>,

    /// Declared options, keyed by name
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,

    /// Linked dependencies, in declaration order
    #[serde(default)]
    pub requires: Vec<Requirement>,

    /// Tools needed in the build environment only
    #[serde(default)]
    pub tool_requires: Vec<ToolRequirement>,

    #[serde(default)]
    pub build: BuildSection,

    /// Consumer-facing metadata
    #[serde(default)]
    pub package_info: PackageInfoSection,
}

impl Recipe {
    /// Option declarations with their domains and defaults
    pub fn option_decls(&self) -> Vec<OptionDecl> {
        self.options
            .iter()
            .map(|(name, spec)| spec.to_decl(name))
            .collect()
    }

    /// Fresh option set with every option at its default
    pub fn default_options(&self) -> Result<OptionSet> {
        OptionSet::from_decls(&self.option_decls())
    }

    /// The `requires` list, checked for duplicates
    pub fn requirements(&self) -> Result<Requirements> {
        Requirements::new(self.requires.clone())
    }

    /// Minimum C++ standard, if the recipe declares one
    pub fn min_cppstd(&self) -> Result<Option<CppStd>> {
        self.build.min_cppstd.as_deref().map(CppStd::parse).transpose()
    }

    /// Whether `key` (or its root, for `compiler.cppstd`) is a declared setting
    pub fn declares_setting(&self, key: &str) -> bool {
        let root = key.split('.').next().unwrap_or(key);
        self.settings.iter().any(|s| s == root)
    }

    /// `name/version`, with `version` falling back to `fallback`
    pub fn reference(&self, fallback: &str) -> String {
        format!(
            "{}/{}",
            self.package.name,
            self.package.version.as_deref().unwrap_or(fallback)
        )
    }
}

/// Package metadata section
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    pub name: String,

    /// Omitted for scm-versioned recipes; the exported commit is used
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,
}

/// One `[options.<name>]` table
#[derive(Debug, Clone, Deserialize)]
pub struct OptionSpec {
    pub values: Vec<OptionValue>,
    pub default: OptionValue,

    /// May be removed by pruning
    #[serde(default)]
    pub removable: bool,
}

impl OptionSpec {
    pub fn to_decl(&self, name: &str) -> OptionDecl {
        OptionDecl {
            name: name.to_string(),
            domain: self.values.clone(),
            default: self.default.clone(),
            removable: self.removable,
        }
    }
}

/// How the recipe revision is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionMode {
    /// The exported commit
    #[default]
    Scm,
    /// sha256 of the recipe file
    Hash,
}

/// Build section
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Lowest accepted `compiler.cppstd`
    #[serde(default)]
    pub min_cppstd: Option<String>,

    /// License file, relative to the source folder
    #[serde(default = "default_license_file")]
    pub license_file: PathBuf,

    /// Project root relative to the recipe folder
    #[serde(default = "default_layout_root")]
    pub layout_root: PathBuf,

    #[serde(default)]
    pub revision_mode: RevisionMode,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            min_cppstd: None,
            license_file: default_license_file(),
            layout_root: default_layout_root(),
            revision_mode: RevisionMode::default(),
        }
    }
}

fn default_license_file() -> PathBuf {
    PathBuf::from("LICENSE")
}

fn default_layout_root() -> PathBuf {
    PathBuf::from("..")
}

/// What consumers link against
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageInfoSection {
    #[serde(default)]
    pub libs: Vec<String>,

    #[serde(default)]
    pub includedirs: Vec<String>,

    #[serde(default)]
    pub libdirs: Vec<String>,
}
