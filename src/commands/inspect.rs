// src/commands/inspect.rs

//! Inspect command - show how a recipe evaluates for a configuration

use super::open_engine;
use crate::cli::RecipeArgs;
use anyhow::Result;
use ladle::{CMake, OptionSlot};

pub fn cmd_inspect(args: &RecipeArgs) -> Result<()> {
    let engine = open_engine(args, |_| {})?;
    let recipe = engine.recipe();
    let revision = engine.recipe_revision()?;

    println!("Recipe: {}", recipe.reference(revision.as_deref().unwrap_or("<unexported>")));
    if let Some(description) = &recipe.package.description {
        println!("  {}", description);
    }
    if let Some(license) = &recipe.package.license {
        println!("License: {}", license);
    }
    if !recipe.package.topics.is_empty() {
        println!("Topics: {}", recipe.package.topics.join(", "));
    }

    println!("\nSettings:");
    for (key, value) in engine.settings().iter() {
        println!("  {}={}", key, value);
    }

    println!("\nOptions:");
    for decl in engine.options().decls() {
        match engine.options().slot(&decl.name) {
            Some(OptionSlot::Present(value)) => println!("  {}={}", decl.name, value),
            _ => println!("  {} (removed)", decl.name),
        }
    }

    if let Some(profile) = engine.profile() {
        println!("\nBuild profile:");
        for def in profile.definitions() {
            println!("  -D{}={}", def.name, def.value);
        }
        println!("\nPackage id: {}", profile.package_id());
    }

    let requirements = engine.requirements()?;
    if !requirements.is_empty() {
        println!("\nRequires:");
        for req in requirements.iter() {
            println!("  {}", req);
        }
    }

    let tools = engine.build_requirements()?;
    if !tools.is_empty() {
        println!("\nTool requires:");
        let cmake_version = CMake::from_path().ok().and_then(|c| c.version());
        for tool in tools {
            match (tool.name.as_str(), cmake_version.as_deref()) {
                ("cmake", Some(version)) if tool.satisfied_by(version) => {
                    println!("  {} (found {})", tool, version)
                }
                ("cmake", Some(version)) => {
                    println!("  {} [WARNING] found {} outside range", tool, version)
                }
                _ => println!("  {}", tool),
            }
        }
    }

    if let Some(layout) = engine.layout() {
        println!("\nLayout:");
        println!("  source:     {}", layout.source_folder.display());
        println!("  build:      {}", layout.build_folder.display());
        println!("  generators: {}", layout.generators_folder.display());
        println!("  package:    {}", layout.package_folder.display());
    }

    if let Some(last) = engine.journal().and_then(|j| j.last()) {
        println!("\nLast completed stage: {}", last);
    }

    Ok(())
}
