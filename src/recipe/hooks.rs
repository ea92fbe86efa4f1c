// src/recipe/hooks.rs

//! Lifecycle hooks
//!
//! Each hook is a free function over the recipe data and the collaborators
//! it needs. The [`Engine`](crate::engine::Engine) calls them in order;
//! they can also be called directly, for instance from tests or from a
//! host that keeps its own state.

use crate::buildtool::{BuildContext, BuildTool};
use crate::error::{ConfigError, Error, MissingCoordinateError, MissingLicenseError, Result};
use crate::layout::Layout;
use crate::metadata::{MetadataStore, SourceCoordinate};
use crate::options::{self, OptionSet};
use crate::profile;
use crate::recipe::format::{Recipe, RevisionMode};
use crate::requirements::{Requirements, ToolRequirement};
use crate::scm::SourceControl;
use crate::settings::Settings;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Whether a missing license file fails `package`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LicensePolicy {
    Mandatory,
    #[default]
    Optional,
}

/// What happened to the test step of `build`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TestStep {
    Ran,
    Skipped { reason: String },
}

/// Result of a successful `build`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub test: TestStep,
}

/// Result of a successful `package`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutcome {
    /// Where the license was copied, if it existed
    pub license: Option<PathBuf>,
}

/// Consumer-facing metadata published by `package_info`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub libs: Vec<String>,
    pub includedirs: Vec<PathBuf>,
    pub libdirs: Vec<PathBuf>,
}

impl PackageInfo {
    /// The package exports nothing beyond its files
    pub fn is_empty(&self) -> bool {
        self.libs.is_empty() && self.includedirs.is_empty() && self.libdirs.is_empty()
    }
}

/// Settings-driven option removal
pub fn config_options(settings: &Settings, options: &OptionSet) -> OptionSet {
    options::remove_fpic_on_windows(settings, options)
}

/// Option-driven option removal
pub fn configure(options: &OptionSet) -> OptionSet {
    options::remove_fpic_when_shared(options)
}

/// Pre-flight check of settings and options
///
/// Pure: touches neither the filesystem nor any external tool.
pub fn validate(recipe: &Recipe, settings: &Settings, options: &OptionSet) -> Result<()> {
    for (key, _) in settings.iter() {
        if !recipe.declares_setting(key) {
            return Err(ConfigError::InvalidSetting {
                key: key.to_string(),
                reason: format!("not a setting of {}", recipe.package.name),
            }
            .into());
        }
    }

    if let Some(required) = recipe.min_cppstd()?
        && let Some(got) = settings.cppstd()?
        && got < required
    {
        return Err(ConfigError::UnsupportedStandard {
            required: required.to_string(),
            got: got.to_string(),
        }
        .into());
    }

    options.check_domains()?;
    Ok(())
}

/// Linked requirements, unchanged and in declaration order
pub fn requirements(recipe: &Recipe) -> Result<Requirements> {
    recipe.requirements()
}

/// Tools needed only inside the build environment
pub fn build_requirements(recipe: &Recipe) -> &[ToolRequirement] {
    &recipe.tool_requires
}

/// Folder layout for the recipe stored in `recipe_folder`
pub fn layout(recipe: &Recipe, recipe_folder: &Path, package_folder: Option<&Path>) -> Layout {
    Layout::compute(recipe_folder, &recipe.build.layout_root, package_folder)
}

/// Capture and persist the coordinate of the checkout holding the recipe
pub fn export(
    scm: &dyn SourceControl,
    store: &dyn MetadataStore,
    recipe_folder: &Path,
) -> Result<SourceCoordinate> {
    let coordinate = scm.get_url_and_commit(recipe_folder)?;
    store.write_coordinate(&coordinate)?;
    info!(
        "Exported {} @ {} to {}",
        coordinate.url,
        coordinate.commit,
        store.location().display()
    );
    Ok(coordinate)
}

/// Reproduce the exported sources in the source folder
pub fn source(
    scm: &dyn SourceControl,
    store: &dyn MetadataStore,
    layout: &Layout,
) -> Result<SourceCoordinate> {
    let coordinate = store
        .read_coordinate()?
        .ok_or_else(|| MissingCoordinateError {
            metadata: store.location(),
        })?;

    let current = scm.current_coordinate(&layout.source_folder)?;
    if current.as_ref().map(|c| c.commit.as_str()) == Some(coordinate.commit.as_str()) {
        debug!(
            "{} is already at {}",
            layout.source_folder.display(),
            coordinate.commit
        );
    } else {
        scm.checkout(&coordinate, &layout.source_folder)?;
    }

    scm.update_submodules(&layout.source_folder)?;
    Ok(coordinate)
}

/// Why the test step cannot run for `settings`, if it cannot
///
/// Being unable to run target binaries is expected when cross-building,
/// so it becomes a skip reason rather than an error.
pub fn test_skip_reason(settings: &Settings, can_run_override: Option<bool>) -> Option<String> {
    if profile::can_run(settings, can_run_override) {
        None
    } else {
        Some(format!("binaries for {} cannot run on this machine", settings))
    }
}

/// Configure and build, then test unless `skip_test` gives a reason not to
pub fn build(
    tool: &dyn BuildTool,
    ctx: &BuildContext<'_>,
    skip_test: Option<String>,
) -> Result<BuildOutcome> {
    tool.configure(ctx)?;
    tool.build(ctx)?;

    let test = match skip_test {
        None => {
            tool.test(ctx)?;
            TestStep::Ran
        }
        Some(reason) => {
            info!("Skipping tests: {}", reason);
            TestStep::Skipped { reason }
        }
    };

    Ok(BuildOutcome { test })
}

/// Install, then copy the license into `<package>/licenses`
///
/// A mandatory license is checked before the install step runs.
pub fn package(
    tool: &dyn BuildTool,
    ctx: &BuildContext<'_>,
    license_file: &Path,
    policy: LicensePolicy,
) -> Result<PackageOutcome> {
    let source = ctx.layout.source_folder.join(license_file);
    let has_license = source.is_file();
    if !has_license && policy == LicensePolicy::Mandatory {
        return Err(MissingLicenseError { path: source }.into());
    }

    tool.install(ctx)?;

    if !has_license {
        warn!("No license file at {}", source.display());
        return Ok(PackageOutcome { license: None });
    }

    let file_name = source
        .file_name()
        .ok_or_else(|| Error::Parse(format!("license path {} has no file name", source.display())))?;
    let licenses = ctx.layout.licenses_folder();
    fs::create_dir_all(&licenses)?;
    let dest = licenses.join(file_name);
    fs::copy(&source, &dest)?;
    debug!("Copied {} to {}", source.display(), dest.display());

    Ok(PackageOutcome {
        license: Some(dest),
    })
}

/// Consumer-facing metadata, relative paths resolved against the package
///
/// Empty unless the recipe fills `[package_info]`.
pub fn package_info(recipe: &Recipe, layout: &Layout) -> PackageInfo {
    let section = &recipe.package_info;
    let resolve = |dirs: &[String]| -> Vec<PathBuf> {
        dirs.iter().map(|d| layout.package_folder.join(d)).collect()
    };
    PackageInfo {
        libs: section.libs.clone(),
        includedirs: resolve(&section.includedirs),
        libdirs: resolve(&section.libdirs),
    }
}

/// Revision identifying this version of the recipe
///
/// The exported commit in scm mode, the sha256 of the recipe file in
/// hash mode.
pub fn recipe_revision(
    recipe: &Recipe,
    recipe_file: &Path,
    coordinate: Option<&SourceCoordinate>,
) -> Result<Option<String>> {
    match recipe.build.revision_mode {
        RevisionMode::Scm => Ok(coordinate.map(|c| c.commit.clone())),
        RevisionMode::Hash => {
            let content = fs::read(recipe_file)?;
            Ok(Some(hex::encode(Sha256::digest(&content))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RecipeDataFile;
    use crate::profile::BuildProfile;
    use crate::recipe::parse_recipe;
    use std::cell::RefCell;
    use tempfile::TempDir;

    const RECIPE: &str = r#"
settings = ["os", "compiler", "build_type", "arch"]

[package]
name = "raymarch"

[options.shared]
values = [true, false]
default = false

[options.fPIC]
values = [true, false]
default = true
removable = true

[build]
min_cppstd = "20"
"#;

    #[derive(Default)]
    struct RecordingTool {
        calls: RefCell<Vec<&'static str>>,
    }

    impl BuildTool for RecordingTool {
        fn configure(&self, _: &BuildContext<'_>) -> Result<()> {
            self.calls.borrow_mut().push("configure");
            Ok(())
        }
        fn build(&self, _: &BuildContext<'_>) -> Result<()> {
            self.calls.borrow_mut().push("build");
            Ok(())
        }
        fn test(&self, _: &BuildContext<'_>) -> Result<()> {
            self.calls.borrow_mut().push("test");
            Ok(())
        }
        fn install(&self, _: &BuildContext<'_>) -> Result<()> {
            self.calls.borrow_mut().push("install");
            Ok(())
        }
    }

    fn settings(cppstd: &str) -> Settings {
        Settings::from_pairs([("os", "Linux"), ("compiler.cppstd", cppstd)])
    }

    #[test]
    fn test_validate_cppstd() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let options = recipe.default_options().unwrap();

        let err = validate(&recipe, &settings("17"), &options).unwrap_err();
        match err {
            Error::Config(ConfigError::UnsupportedStandard { required, got }) => {
                assert_eq!(required, "20");
                assert_eq!(got, "17");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(validate(&recipe, &settings("20"), &options).is_ok());
        assert!(validate(&recipe, &settings("gnu23"), &options).is_ok());
        assert!(validate(&recipe, &Settings::from_pairs([("os", "Linux")]), &options).is_ok());
    }

    #[test]
    fn test_validate_rejects_98() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let options = recipe.default_options().unwrap();
        assert!(validate(&recipe, &settings("98"), &options).is_err());
    }

    #[test]
    fn test_validate_undeclared_setting() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let options = recipe.default_options().unwrap();
        let settings = Settings::from_pairs([("distro", "debian")]);
        assert!(matches!(
            validate(&recipe, &settings, &options),
            Err(Error::Config(ConfigError::InvalidSetting { .. }))
        ));
    }

    #[test]
    fn test_config_options_then_configure() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let options = recipe
            .default_options()
            .unwrap()
            .with_overrides(&[("shared", "True")])
            .unwrap();

        let linux = Settings::from_pairs([("os", "Linux")]);
        let after_config = config_options(&linux, &options);
        assert!(after_config.is_present("fPIC"));
        assert!(!configure(&after_config).is_present("fPIC"));
    }

    #[test]
    fn test_source_before_export() {
        struct NoScm;
        impl SourceControl for NoScm {
            fn get_url_and_commit(&self, _: &Path) -> Result<SourceCoordinate> {
                unreachable!()
            }
            fn checkout(&self, _: &SourceCoordinate, _: &Path) -> Result<()> {
                panic!("checkout must not run without a coordinate")
            }
            fn update_submodules(&self, _: &Path) -> Result<()> {
                panic!("submodules must not run without a coordinate")
            }
            fn current_coordinate(&self, _: &Path) -> Result<Option<SourceCoordinate>> {
                Ok(None)
            }
        }

        let dir = TempDir::new().unwrap();
        let store = RecipeDataFile::in_folder(dir.path());
        let layout = Layout::compute(dir.path(), Path::new("."), None);
        let err = source(&NoScm, &store, &layout).unwrap_err();
        assert!(matches!(err, Error::MissingCoordinate(_)));
    }

    #[test]
    fn test_build_skips_tests_when_cannot_run() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::compute(dir.path(), Path::new("."), None);
        let profile = BuildProfile::derive(&Settings::empty(), &OptionSet::default()).unwrap();
        let ctx = BuildContext { layout: &layout, profile: &profile, jobs: 1 };

        let tool = RecordingTool::default();
        let reason = test_skip_reason(&Settings::empty(), Some(false));
        assert!(reason.is_some());
        let outcome = build(&tool, &ctx, reason).unwrap();
        assert!(matches!(outcome.test, TestStep::Skipped { .. }));
        assert_eq!(*tool.calls.borrow(), ["configure", "build"]);

        let tool = RecordingTool::default();
        let reason = test_skip_reason(&Settings::host(), None);
        assert_eq!(build(&tool, &ctx, reason).unwrap().test, TestStep::Ran);
        assert_eq!(*tool.calls.borrow(), ["configure", "build", "test"]);
    }

    #[test]
    fn test_package_license_policy() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::compute(dir.path(), Path::new("."), None);
        let profile = BuildProfile::derive(&Settings::empty(), &OptionSet::default()).unwrap();
        let ctx = BuildContext { layout: &layout, profile: &profile, jobs: 1 };
        let tool = RecordingTool::default();

        let outcome = package(&tool, &ctx, Path::new("LICENSE"), LicensePolicy::Optional).unwrap();
        assert!(outcome.license.is_none());

        let err = package(&tool, &ctx, Path::new("LICENSE"), LicensePolicy::Mandatory).unwrap_err();
        assert!(matches!(err, Error::MissingLicense(_)));
        assert_eq!(*tool.calls.borrow(), ["install"]);

        fs::write(dir.path().join("LICENSE"), "MIT").unwrap();
        let outcome = package(&tool, &ctx, Path::new("LICENSE"), LicensePolicy::Mandatory).unwrap();
        let copied = outcome.license.unwrap();
        assert_eq!(copied, layout.licenses_folder().join("LICENSE"));
        assert_eq!(fs::read_to_string(copied).unwrap(), "MIT");
    }

    #[test]
    fn test_package_info_empty_by_default() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let layout = Layout::compute(Path::new("/w/conan"), Path::new(".."), None);
        assert!(package_info(&recipe, &layout).is_empty());
    }

    #[test]
    fn test_package_info_resolves_dirs() {
        let recipe = parse_recipe(
            "[package]\nname = \"x\"\n[package_info]\nlibs = [\"x\"]\nincludedirs = [\"include\"]\n",
        )
        .unwrap();
        let layout = Layout::compute(Path::new("/w/conan"), Path::new(".."), None);
        let info = package_info(&recipe, &layout);
        assert_eq!(info.libs, ["x"]);
        assert_eq!(info.includedirs, [PathBuf::from("/w/package/include")]);
    }

    #[test]
    fn test_recipe_revision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recipe.toml");
        fs::write(&path, RECIPE).unwrap();
        let coordinate = SourceCoordinate::new("https://example.com/r.git", "abc");

        let scm = parse_recipe(RECIPE).unwrap();
        assert_eq!(
            recipe_revision(&scm, &path, Some(&coordinate)).unwrap().as_deref(),
            Some("abc")
        );
        assert!(recipe_revision(&scm, &path, None).unwrap().is_none());

        let mut hashed = scm.clone();
        hashed.build.revision_mode = RevisionMode::Hash;
        let rev = recipe_revision(&hashed, &path, None).unwrap().unwrap();
        assert_eq!(rev.len(), 64);
    }
}
