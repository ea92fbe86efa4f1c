// src/engine/mod.rs

//! Recipe lifecycle engine
//!
//! The engine owns one evaluation of one recipe and walks it through the
//! stages
//!
//! ```text
//! Instantiated -> OptionsPruned -> Validated -> LayoutComputed
//!     -> (Exported) -> Sourced -> Built -> Packaged -> InfoPublished
//! ```
//!
//! A hook only runs once the stage it depends on has completed. Stages from
//! `Sourced` on are recorded in a [`StageJournal`] in the build folder, so a
//! later process evaluating the same configuration picks up where the
//! previous one stopped.

mod config;
mod journal;
mod stage;

pub use crate::recipe::hooks::{
    BuildOutcome, LicensePolicy, PackageInfo, PackageOutcome, TestStep,
};
pub use config::EngineConfig;
pub use journal::{JournalEntry, StageJournal, JOURNAL_FILE};
pub use stage::Stage;

use crate::buildtool::{BuildContext, BuildTool, CMake};
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::metadata::{MetadataStore, RecipeDataFile, SourceCoordinate};
use crate::options::OptionSet;
use crate::profile::BuildProfile;
use crate::recipe::{hooks, parse_recipe_file, validate_recipe, Recipe};
use crate::requirements::{Requirements, ToolRequirement};
use crate::scm::{Git, SourceControl};
use crate::settings::Settings;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What `create` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReport {
    /// Exported coordinate, when export was requested
    pub exported: Option<SourceCoordinate>,
    /// Last stage found in the journal before this run
    pub resumed_from: Option<Stage>,
    /// `None` when the build was already complete
    pub build: Option<BuildOutcome>,
    /// `None` when packaging was already complete
    pub package: Option<PackageOutcome>,
    pub info: PackageInfo,
}

/// One evaluation of a recipe
pub struct Engine {
    recipe: Recipe,
    recipe_file: PathBuf,
    recipe_folder: PathBuf,
    settings: Settings,
    option_overrides: Vec<(String, String)>,
    config: EngineConfig,
    scm: Box<dyn SourceControl>,
    store: Box<dyn MetadataStore>,
    tool: Box<dyn BuildTool>,

    stage: Stage,
    options: OptionSet,
    profile: Option<BuildProfile>,
    layout: Option<Layout>,
    journal: Option<StageJournal>,
}

impl Engine {
    /// Instantiate `recipe`, read from `recipe_file`
    ///
    /// Uses git, the recipe data file next to the recipe and CMake as
    /// collaborators; replace them with the `with_*` methods.
    pub fn new(
        recipe: Recipe,
        recipe_file: &Path,
        settings: Settings,
        option_overrides: Vec<(String, String)>,
        config: EngineConfig,
    ) -> Result<Self> {
        for warning in validate_recipe(&recipe)? {
            warn!("{}: {}", recipe.package.name, warning);
        }

        let recipe_folder = recipe_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let mut git = Git::with_program(&config.git_program);
        if !config.require_pushed {
            git = git.allow_unpushed();
        }
        let cmake = CMake::with_programs(&config.cmake_program, &config.ctest_program)
            .with_generator(config.generator.clone());
        let options = recipe.default_options()?;

        info!("Instantiated {} ({})", recipe.package.name, settings);

        Ok(Self {
            store: Box::new(RecipeDataFile::in_folder(&recipe_folder)),
            scm: Box::new(git),
            tool: Box::new(cmake),
            recipe,
            recipe_file: recipe_file.to_path_buf(),
            recipe_folder,
            settings,
            option_overrides,
            config,
            stage: Stage::Instantiated,
            options,
            profile: None,
            layout: None,
            journal: None,
        })
    }

    /// Parse the recipe file and instantiate it
    pub fn load(
        recipe_file: &Path,
        settings: Settings,
        option_overrides: Vec<(String, String)>,
        config: EngineConfig,
    ) -> Result<Self> {
        let recipe = parse_recipe_file(recipe_file)?;
        Self::new(recipe, recipe_file, settings, option_overrides, config)
    }

    pub fn with_source_control(mut self, scm: Box<dyn SourceControl>) -> Self {
        self.scm = scm;
        self
    }

    pub fn with_metadata_store(mut self, store: Box<dyn MetadataStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_build_tool(mut self, tool: Box<dyn BuildTool>) -> Self {
        self.tool = tool;
        self
    }

    /// Last completed stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current options; pruned once `prune_options` has run
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn profile(&self) -> Option<&BuildProfile> {
        self.profile.as_ref()
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn journal(&self) -> Option<&StageJournal> {
        self.journal.as_ref()
    }

    fn enter(&self, hook: &'static str, stage: Stage) -> Result<()> {
        match stage.requires() {
            Some(required) if self.stage < required => Err(Error::Stage {
                hook,
                required: required.to_string(),
                current: self.stage.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn complete(&mut self, stage: Stage) -> Result<()> {
        if stage.is_persistent() {
            // Rerunning a stage invalidates everything after it
            self.stage = stage;
            if let (Some(journal), Some(layout)) = (self.journal.as_mut(), self.layout.as_ref()) {
                journal.record(stage);
                journal.save(&StageJournal::path_in(&layout.state_folder()))?;
            }
        } else {
            self.stage = self.stage.max(stage);
        }
        Ok(())
    }

    fn context(&self, hook: &'static str) -> Result<BuildContext<'_>> {
        match (self.layout.as_ref(), self.profile.as_ref()) {
            (Some(layout), Some(profile)) => Ok(BuildContext {
                layout,
                profile,
                jobs: self.config.jobs,
            }),
            _ => Err(Error::Stage {
                hook,
                required: Stage::LayoutComputed.to_string(),
                current: self.stage.to_string(),
            }),
        }
    }

    /// `config_options`, then user overrides, then `configure`
    ///
    /// Overrides for an option removed by `config_options` are dropped.
    pub fn prune_options(&mut self) -> Result<&OptionSet> {
        self.enter("prune_options", Stage::OptionsPruned)?;

        let defaults = self.recipe.default_options()?;
        let options = hooks::config_options(&self.settings, &defaults);
        let options = options.with_overrides(&self.option_overrides)?;
        self.options = hooks::configure(&options);

        info!("Options: {}", self.options);
        self.complete(Stage::OptionsPruned)?;
        Ok(&self.options)
    }

    /// Pre-flight check; nothing external has run before this succeeds
    pub fn validate(&mut self) -> Result<()> {
        self.enter("validate", Stage::Validated)?;

        hooks::validate(&self.recipe, &self.settings, &self.options)?;
        self.profile = Some(BuildProfile::derive(&self.settings, &self.options)?);

        self.complete(Stage::Validated)
    }

    /// Linked requirements in declaration order
    pub fn requirements(&self) -> Result<Requirements> {
        hooks::requirements(&self.recipe)
    }

    pub fn build_requirements(&self) -> Result<&[ToolRequirement]> {
        self.enter("build_requirements", Stage::LayoutComputed)?;
        Ok(hooks::build_requirements(&self.recipe))
    }

    /// Compute the folders and pick up the journal for this configuration
    pub fn layout_folders(&mut self) -> Result<&Layout> {
        self.enter("layout", Stage::LayoutComputed)?;

        let layout = hooks::layout(
            &self.recipe,
            &self.recipe_folder,
            self.config.package_folder.as_deref(),
        );
        let package_id = self
            .profile
            .as_ref()
            .map(BuildProfile::package_id)
            .unwrap_or_default();
        let exported = self.store.read_coordinate()?;
        let journal = StageJournal::load_or_new(
            &StageJournal::path_in(&layout.state_folder()),
            &package_id,
            exported.as_ref(),
        )?;

        self.complete(Stage::LayoutComputed)?;
        if let Some(last) = journal.last() {
            info!("Resuming after stage {}", last);
            self.stage = self.stage.max(last);
        }
        self.journal = Some(journal);
        Ok(&*self.layout.insert(layout))
    }

    /// Prune options, validate and compute the layout
    pub fn prepare(&mut self) -> Result<()> {
        self.prune_options()?;
        self.validate()?;
        self.layout_folders()?;
        Ok(())
    }

    /// Record the coordinate of the checkout holding the recipe
    pub fn export(&mut self) -> Result<SourceCoordinate> {
        self.enter("export", Stage::Exported)?;
        let coordinate = hooks::export(self.scm.as_ref(), self.store.as_ref(), &self.recipe_folder)?;
        self.complete(Stage::Exported)?;
        Ok(coordinate)
    }

    /// Check out the exported coordinate into the source folder
    pub fn source(&mut self) -> Result<SourceCoordinate> {
        self.enter("source", Stage::Sourced)?;
        let layout = self.layout.as_ref().ok_or_else(|| Error::Stage {
            hook: "source",
            required: Stage::LayoutComputed.to_string(),
            current: self.stage.to_string(),
        })?;
        let coordinate = hooks::source(self.scm.as_ref(), self.store.as_ref(), layout)?;
        if let Some(journal) = self.journal.as_mut() {
            journal.source = Some(coordinate.clone());
        }
        self.complete(Stage::Sourced)?;
        Ok(coordinate)
    }

    pub fn build(&mut self) -> Result<BuildOutcome> {
        self.enter("build", Stage::Built)?;

        let skip_test = if self.config.skip_tests {
            Some("tests disabled by configuration".to_string())
        } else {
            hooks::test_skip_reason(&self.settings, self.config.can_run)
        };

        let outcome = {
            let ctx = self.context("build")?;
            hooks::build(self.tool.as_ref(), &ctx, skip_test)?
        };

        self.complete(Stage::Built)?;
        Ok(outcome)
    }

    pub fn package(&mut self) -> Result<PackageOutcome> {
        self.enter("package", Stage::Packaged)?;

        let outcome = {
            let ctx = self.context("package")?;
            hooks::package(
                self.tool.as_ref(),
                &ctx,
                &self.recipe.build.license_file,
                self.config.license_policy,
            )?
        };

        self.complete(Stage::Packaged)?;
        Ok(outcome)
    }

    pub fn package_info(&mut self) -> Result<PackageInfo> {
        self.enter("package_info", Stage::InfoPublished)?;
        let info = {
            let ctx = self.context("package_info")?;
            hooks::package_info(&self.recipe, ctx.layout)
        };
        self.complete(Stage::InfoPublished)?;
        Ok(info)
    }

    /// Revision of the recipe: exported commit or hash of the recipe file
    pub fn recipe_revision(&self) -> Result<Option<String>> {
        let coordinate = self.store.read_coordinate()?;
        hooks::recipe_revision(&self.recipe, &self.recipe_file, coordinate.as_ref())
    }

    /// Run the whole lifecycle, skipping stages the journal shows complete
    pub fn create(&mut self, export: bool) -> Result<CreateReport> {
        self.prepare()?;
        let resumed_from = self.journal.as_ref().and_then(StageJournal::last);

        let exported = if export { Some(self.export()?) } else { None };

        // A new export may point at another commit than the one sourced
        if export || !self.journal_has(Stage::Sourced) {
            self.source()?;
        }

        let build = if self.journal_has(Stage::Built) {
            info!("Build already complete");
            None
        } else {
            Some(self.build()?)
        };

        let package = if self.journal_has(Stage::Packaged) {
            info!("Package already complete");
            None
        } else {
            Some(self.package()?)
        };

        let info = self.package_info()?;

        Ok(CreateReport {
            exported,
            resumed_from,
            build,
            package,
            info,
        })
    }

    fn journal_has(&self, stage: Stage) -> bool {
        self.journal.as_ref().is_some_and(|j| j.has(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parse_recipe;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    const RECIPE: &str = r#"
settings = ["os", "compiler", "build_type", "arch"]

[package]
name = "raymarch"
license = "MIT"
description = "Toy raymarcher in GLSL."

[options.shared]
values = [true, false]
default = false

[options.fPIC]
values = [true, false]
default = true
removable = true

[build]
min_cppstd = "20"
layout_root = "."
"#;

    #[derive(Clone, Default)]
    struct Calls(Rc<RefCell<Vec<&'static str>>>);

    impl Calls {
        fn push(&self, call: &'static str) {
            self.0.borrow_mut().push(call);
        }
    }

    struct FakeTool(Calls);

    impl BuildTool for FakeTool {
        fn configure(&self, _: &BuildContext<'_>) -> Result<()> {
            self.0.push("configure");
            Ok(())
        }
        fn build(&self, _: &BuildContext<'_>) -> Result<()> {
            self.0.push("build");
            Ok(())
        }
        fn test(&self, _: &BuildContext<'_>) -> Result<()> {
            self.0.push("test");
            Ok(())
        }
        fn install(&self, _: &BuildContext<'_>) -> Result<()> {
            self.0.push("install");
            Ok(())
        }
    }

    fn engine(dir: &Path, settings: Settings, overrides: &[(&str, &str)]) -> (Engine, Calls) {
        let recipe = parse_recipe(RECIPE).unwrap();
        let overrides = overrides
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let calls = Calls::default();
        let engine = Engine::new(
            recipe,
            &dir.join("recipe.toml"),
            settings,
            overrides,
            EngineConfig::default(),
        )
        .unwrap()
        .with_build_tool(Box::new(FakeTool(calls.clone())));
        (engine, calls)
    }

    #[test]
    fn test_windows_prunes_fpic() {
        let dir = TempDir::new().unwrap();
        let (mut engine, _) = engine(dir.path(), Settings::from_pairs([("os", "Windows")]), &[]);
        let options = engine.prune_options().unwrap();
        assert!(!options.is_present("fPIC"));
        assert_eq!(engine.stage(), Stage::OptionsPruned);
    }

    #[test]
    fn test_override_of_removed_option_is_dropped() {
        let dir = TempDir::new().unwrap();
        let (mut engine, _) = engine(
            dir.path(),
            Settings::from_pairs([("os", "Windows")]),
            &[("fPIC", "False")],
        );
        assert!(!engine.prune_options().unwrap().is_present("fPIC"));
    }

    #[test]
    fn test_shared_override_prunes_fpic() {
        let dir = TempDir::new().unwrap();
        let (mut engine, _) = engine(
            dir.path(),
            Settings::from_pairs([("os", "Linux")]),
            &[("shared", "True")],
        );
        assert!(!engine.prune_options().unwrap().is_present("fPIC"));
    }

    #[test]
    fn test_out_of_order_hooks() {
        let dir = TempDir::new().unwrap();
        let (mut engine, calls) = engine(dir.path(), Settings::empty(), &[]);

        assert!(matches!(engine.validate(), Err(Error::Stage { hook: "validate", .. })));
        assert!(matches!(engine.build(), Err(Error::Stage { hook: "build", .. })));

        engine.prepare().unwrap();
        assert!(matches!(engine.package(), Err(Error::Stage { hook: "package", .. })));
        assert!(calls.0.borrow().is_empty());
    }

    #[test]
    fn test_validate_failure_stops_before_layout() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::from_pairs([("compiler.cppstd", "17")]);
        let (mut engine, _) = engine(dir.path(), settings, &[]);
        engine.prune_options().unwrap();
        assert!(engine.validate().is_err());
        assert_eq!(engine.stage(), Stage::OptionsPruned);
        assert!(engine.layout_folders().is_err());
        assert!(!dir.path().join("build").exists());
    }

    #[test]
    fn test_build_package_with_can_run_override() {
        let dir = TempDir::new().unwrap();
        let recipe = parse_recipe(RECIPE).unwrap();
        let calls = Calls::default();
        let config = EngineConfig {
            can_run: Some(false),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(
            recipe,
            &dir.path().join("recipe.toml"),
            Settings::empty(),
            Vec::new(),
            config,
        )
        .unwrap()
        .with_build_tool(Box::new(FakeTool(calls.clone())));

        engine.prepare().unwrap();
        // Pretend sources are in place
        engine.complete(Stage::Sourced).unwrap();

        let outcome = engine.build().unwrap();
        assert!(matches!(outcome.test, TestStep::Skipped { .. }));
        engine.package().unwrap();
        assert!(engine.package_info().unwrap().is_empty());

        assert_eq!(*calls.0.borrow(), ["configure", "build", "install"]);
        assert_eq!(engine.stage(), Stage::InfoPublished);
    }
}
