// src/recipe/mod.rs

//! Package recipes
//!
//! A recipe is plain data (package metadata, settings it reads, declared
//! options, requirements) plus a library of hook functions operating on it.
//! There is no recipe base type to extend: a recipe that needs different
//! behaviour composes the hooks and pruning rules it wants.
//!
//! # Example Recipe
//!
//! ```toml
//! settings = ["os", "compiler", "build_type", "arch"]
//! requires = ["glad/0.1.36", "glfw/3.4"]
//! tool_requires = ["cmake/[>=3.23]"]
//!
//! [package]
//! name = "raymarch"
//! license = "MIT"
//!
//! [options.shared]
//! values = [true, false]
//! default = false
//!
//! [options.fPIC]
//! values = [true, false]
//! default = true
//! removable = true
//!
//! [build]
//! min_cppstd = "20"
//! layout_root = ".."
//! ```

mod format;
pub mod hooks;
pub mod parser;

pub use format::{
    BuildSection, OptionSpec, PackageInfoSection, PackageSection, Recipe, RevisionMode,
};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};

/// Default recipe file name inside a recipe folder
pub const RECIPE_FILE: &str = "recipe.toml";
