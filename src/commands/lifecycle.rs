// src/commands/lifecycle.rs

//! Lifecycle commands - export, source, build, package and create

use super::open_engine;
use crate::cli::RecipeArgs;
use anyhow::{Context, Result};
use ladle::{BuildOutcome, PackageOutcome, TestStep};
use tracing::info;

pub fn cmd_export(args: &RecipeArgs, allow_unpushed: bool) -> Result<()> {
    let mut engine = open_engine(args, |config| config.require_pushed = !allow_unpushed)?;
    let coordinate = engine.export().context("Export failed")?;

    println!("Exported {}", engine.recipe().reference(&coordinate.commit));
    println!("  url:    {}", coordinate.url);
    println!("  commit: {}", coordinate.commit);
    Ok(())
}

pub fn cmd_source(args: &RecipeArgs) -> Result<()> {
    let mut engine = open_engine(args, |_| {})?;
    let coordinate = engine.source().context("Source failed")?;

    println!("Sources at {} ({})", coordinate.commit, coordinate.url);
    Ok(())
}

pub fn cmd_build(args: &RecipeArgs, skip_tests: bool) -> Result<()> {
    let mut engine = open_engine(args, |config| config.skip_tests = skip_tests)?;
    info!("Building with {}", engine.options());

    let outcome = engine.build().context("Build failed")?;
    print_build(&outcome);
    Ok(())
}

pub fn cmd_package(args: &RecipeArgs) -> Result<()> {
    let mut engine = open_engine(args, |_| {})?;
    let outcome = engine.package().context("Package failed")?;

    if let Some(layout) = engine.layout() {
        println!("Packaged into {}", layout.package_folder.display());
    }
    print_package(&outcome);
    Ok(())
}

pub fn cmd_create(
    args: &RecipeArgs,
    no_export: bool,
    allow_unpushed: bool,
    skip_tests: bool,
) -> Result<()> {
    let mut engine = open_engine(args, |config| {
        config.require_pushed = !allow_unpushed;
        config.skip_tests = skip_tests;
    })?;

    let report = engine
        .create(!no_export)
        .with_context(|| format!("Failed to create {}", engine.recipe().package.name))?;

    if let Some(stage) = report.resumed_from {
        println!("Resumed after stage {}", stage);
    }
    if let Some(coordinate) = &report.exported {
        println!("Exported {} @ {}", coordinate.url, coordinate.commit);
    }
    match &report.build {
        Some(outcome) => print_build(outcome),
        None => println!("Build: already complete"),
    }
    match &report.package {
        Some(outcome) => print_package(outcome),
        None => println!("Package: already complete"),
    }
    if report.info.is_empty() {
        println!("Package info: nothing exported beyond files");
    } else {
        println!("Package info: {}", serde_json::to_string(&report.info)?);
    }

    if let Some(profile) = engine.profile() {
        println!("\n[COMPLETE] {} package id {}", engine.recipe().package.name, profile.package_id());
    }
    Ok(())
}

fn print_build(outcome: &BuildOutcome) {
    match &outcome.test {
        TestStep::Ran => println!("Build: done, tests passed"),
        TestStep::Skipped { reason } => println!("Build: done, tests skipped ({})", reason),
    }
}

fn print_package(outcome: &PackageOutcome) {
    match &outcome.license {
        Some(path) => println!("License: {}", path.display()),
        None => println!("License: [WARNING] no license file packaged"),
    }
}
