// src/lib.rs

//! Ladle: a package recipe lifecycle engine
//!
//! A recipe describes how to fetch, configure, build, test and package a
//! native component for a given set of platform settings and build options.
//! This crate evaluates such recipes.
//!
//! # Architecture
//!
//! - Recipes are plain data (TOML) plus a library of hook functions
//! - Options live in explicit `Present`/`Absent` slots; pruning returns a new set
//! - Source provenance is a `(url, commit)` pair persisted next to the recipe
//! - External tools (git, CMake) sit behind narrow traits
//! - The engine enforces hook order and resumes from its on-disk journal

pub mod buildtool;
pub mod engine;
mod error;
pub mod layout;
pub mod metadata;
pub mod options;
pub mod profile;
pub mod recipe;
pub mod requirements;
pub mod scm;
pub mod settings;

pub use buildtool::{BuildContext, BuildTool, CMake};
pub use engine::{
    BuildOutcome, CreateReport, Engine, EngineConfig, LicensePolicy, PackageInfo,
    PackageOutcome, Stage, StageJournal, TestStep,
};
pub use error::{
    BuildToolError, ConfigError, DirtyCheckoutError, Error, MissingCoordinateError,
    MissingLicenseError, Result, ScmStateError,
};
pub use layout::Layout;
pub use metadata::{MetadataStore, RecipeDataFile, SourceCoordinate, RECIPE_DATA_FILE};
pub use options::{OptionDecl, OptionSet, OptionSlot, OptionValue};
pub use profile::BuildProfile;
pub use recipe::{parse_recipe, parse_recipe_file, validate_recipe, Recipe};
pub use requirements::{Requirement, Requirements, ToolRequirement};
pub use scm::{Git, SourceControl};
pub use settings::{CppStd, ProfileFile, Settings};
