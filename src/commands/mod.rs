// src/commands/mod.rs
//! Command handlers for the ladle CLI

mod inspect;
mod lifecycle;

pub use inspect::cmd_inspect;
pub use lifecycle::{cmd_build, cmd_create, cmd_export, cmd_package, cmd_source};

use crate::cli::RecipeArgs;
use anyhow::{Context, Result};
use ladle::recipe::RECIPE_FILE;
use ladle::settings::{parse_assignment, ProfileFile, Settings};
use ladle::{Engine, EngineConfig, LicensePolicy};
use std::path::PathBuf;

/// Profile `[conf]` key forcing whether target binaries can run
const CAN_RUN_CONF: &str = "tools.build.cross_building:can_run";

/// Everything needed to instantiate an engine, resolved from the arguments
struct Invocation {
    recipe_file: PathBuf,
    settings: Settings,
    options: Vec<(String, String)>,
    config: EngineConfig,
}

impl Invocation {
    fn resolve(args: &RecipeArgs) -> Result<Self> {
        let recipe_file = if args.recipe.is_dir() {
            args.recipe.join(RECIPE_FILE)
        } else {
            args.recipe.clone()
        };

        let profile = match &args.profile {
            Some(path) => ProfileFile::load(path)
                .with_context(|| format!("Failed to read profile: {}", path.display()))?,
            None => ProfileFile::default(),
        };

        // Command line wins over the profile
        let cli_settings = Settings::parse_assignments(&args.settings)
            .context("Invalid -s/--settings value")?;
        let settings = profile.settings.merged(&cli_settings);

        let mut options = profile.options.clone();
        for assignment in &args.options {
            options.push(
                parse_assignment(assignment)
                    .with_context(|| format!("Invalid -o/--options value: {}", assignment))?,
            );
        }

        let can_run = match args.can_run {
            Some(value) => Some(value),
            None => profile.conf_bool(CAN_RUN_CONF)?,
        };

        let mut config = EngineConfig {
            package_folder: args.package_folder.clone(),
            generator: args.generator.clone(),
            can_run,
            license_policy: if args.require_license {
                LicensePolicy::Mandatory
            } else {
                LicensePolicy::Optional
            },
            ..EngineConfig::default()
        };
        if let Some(jobs) = args.jobs {
            config.jobs = jobs.max(1);
        }
        if let Some(cmake) = &args.cmake {
            config.cmake_program = cmake.clone();
            if let Some(dir) = cmake.parent().filter(|d| !d.as_os_str().is_empty()) {
                config.ctest_program = dir.join("ctest");
            }
        }

        Ok(Self {
            recipe_file,
            settings,
            options,
            config,
        })
    }
}

/// Load the recipe and run the pre-flight stages
fn open_engine(args: &RecipeArgs, adjust: impl FnOnce(&mut EngineConfig)) -> Result<Engine> {
    let mut invocation = Invocation::resolve(args)?;
    adjust(&mut invocation.config);

    let mut engine = Engine::load(
        &invocation.recipe_file,
        invocation.settings,
        invocation.options,
        invocation.config,
    )
    .with_context(|| format!("Failed to load recipe: {}", invocation.recipe_file.display()))?;

    engine.prepare().context("Recipe configuration rejected")?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(recipe: PathBuf) -> RecipeArgs {
        RecipeArgs {
            recipe,
            settings: vec!["os=Linux".to_string()],
            options: vec!["shared=True".to_string()],
            profile: None,
            package_folder: None,
            can_run: None,
            require_license: true,
            jobs: Some(0),
            generator: None,
            cmake: Some(PathBuf::from("/opt/cmake/bin/cmake")),
        }
    }

    #[test]
    fn test_resolve_folder_and_flags() {
        let dir = TempDir::new().unwrap();
        let invocation = Invocation::resolve(&args(dir.path().to_path_buf())).unwrap();

        assert_eq!(invocation.recipe_file, dir.path().join(RECIPE_FILE));
        assert_eq!(invocation.settings.os(), Some("Linux"));
        assert_eq!(invocation.options, [("shared".to_string(), "True".to_string())]);
        assert_eq!(invocation.config.license_policy, LicensePolicy::Mandatory);
        assert_eq!(invocation.config.jobs, 1);
        assert_eq!(invocation.config.ctest_program, PathBuf::from("/opt/cmake/bin/ctest"));
    }

    #[test]
    fn test_profile_merges_under_cli() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("linux-cross");
        fs::write(
            &profile,
            "[settings]\nos=Windows\narch=armv8\n[options]\nfPIC=False\n[conf]\ntools.build.cross_building:can_run=True\n",
        )
        .unwrap();

        let mut args = args(dir.path().join("recipe.toml"));
        args.profile = Some(profile);
        let invocation = Invocation::resolve(&args).unwrap();

        assert_eq!(invocation.settings.os(), Some("Linux"));
        assert_eq!(invocation.settings.arch(), Some("armv8"));
        assert_eq!(invocation.options[0], ("fPIC".to_string(), "False".to_string()));
        assert_eq!(invocation.config.can_run, Some(true));
    }
}
