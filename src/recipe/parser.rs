// src/recipe/parser.rs

//! Recipe file parsing

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::requirements::Requirements;
use std::path::Path;

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::Parse(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path)?;
    parse_recipe(&content)
}

/// Validate a recipe for completeness and correctness
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.is_empty() {
        return Err(Error::Parse("Recipe package name cannot be empty".to_string()));
    }
    if recipe.package.version.as_deref() == Some("") {
        return Err(Error::Parse("Recipe package version cannot be empty".to_string()));
    }

    // Option defaults must lie in their own domain
    recipe.default_options()?;

    Requirements::new(recipe.requires.clone())?;
    recipe.min_cppstd()?;

    for (name, spec) in &recipe.options {
        if spec.values.is_empty() {
            return Err(Error::Parse(format!("Option '{}' has no allowed values", name)));
        }
    }

    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if recipe.settings.is_empty() {
        warnings.push("Recipe declares no settings".to_string());
    }

    Ok(warnings)
}
