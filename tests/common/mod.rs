// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use ladle::metadata::{MetadataStore, SourceCoordinate};
use ladle::scm::SourceControl;
use ladle::{
    BuildContext, BuildTool, BuildToolError, Engine, EngineConfig, Error, Result, ScmStateError,
    Settings,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;
use tempfile::TempDir;

/// The raymarch recipe, with the project root one level above the recipe
pub const RAYMARCH_RECIPE: &str = r#"
settings = ["os", "compiler", "build_type", "arch"]
requires = ["math/ee8b6fb1ed@adnn", "glad/0.1.36", "glfw/3.4"]
tool_requires = ["cmake/[>=3.23]"]

[package]
name = "raymarch"
license = "MIT"
author = "adnn"
url = "https://github.com/Adnn/raymarch"
description = "Toy raymarcher in GLSL."
topics = ["graphics", "ray-marching", "opengl"]

[options.shared]
values = [true, false]
default = false

[options.fPIC]
values = [true, false]
default = true
removable = true

[options.visibility]
values = ["default", "hidden"]
default = "hidden"

[build]
min_cppstd = "20"
"#;

pub const UPSTREAM_URL: &str = "https://github.com/Adnn/raymarch.git";
pub const COMMIT: &str = "4f1c9a0e7b2d35c8a6e01f9d2b7c4e8a1d3f5b60";

/// A project folder holding `conan/recipe.toml` and a LICENSE at its root
///
/// Returns (TempDir, recipe file) - keep the TempDir alive to prevent cleanup.
pub fn setup_project() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let recipe_folder = dir.path().join("conan");
    fs::create_dir_all(&recipe_folder).unwrap();

    let recipe_file = recipe_folder.join("recipe.toml");
    fs::write(&recipe_file, RAYMARCH_RECIPE).unwrap();
    fs::write(dir.path().join("LICENSE"), "MIT License\n").unwrap();

    (dir, recipe_file)
}

/// Host settings with a C++ standard
pub fn native_settings(cppstd: &str) -> Settings {
    Settings::host().merged(&Settings::from_pairs([
        ("compiler", "gcc"),
        ("compiler.cppstd", cppstd),
        ("build_type", "Release"),
    ]))
}

/// Settings for an architecture this machine cannot run
pub fn foreign_settings() -> Settings {
    let host = Settings::host();
    let arch = if host.arch() == Some("s390x") { "x86_64" } else { "s390x" };
    host.merged(&Settings::from_pairs([
        ("arch", arch),
        ("compiler.cppstd", "20"),
    ]))
}

/// Log of calls made to the fakes
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Build tool that records its phases and can be told to fail one
#[derive(Debug, Clone, Default)]
pub struct FakeBuildTool {
    pub log: CallLog,
    pub fail_phase: Option<&'static str>,
}

impl FakeBuildTool {
    fn run(&self, phase: &'static str, ctx: &BuildContext<'_>) -> Result<()> {
        self.log.push(phase);
        if self.fail_phase == Some(phase) {
            return Err(BuildToolError {
                program: "cmake".to_string(),
                phase: phase.to_string(),
                code: Some(2),
                stderr: format!("CMake Error: {} exploded", phase),
            }
            .into());
        }
        if phase == "install" {
            fs::create_dir_all(ctx.layout.package_folder.join("bin")).unwrap();
        }
        Ok(())
    }
}

impl BuildTool for FakeBuildTool {
    fn configure(&self, ctx: &BuildContext<'_>) -> Result<()> {
        self.run("configure", ctx)
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        self.run("build", ctx)
    }

    fn test(&self, ctx: &BuildContext<'_>) -> Result<()> {
        self.run("test", ctx)
    }

    fn install(&self, ctx: &BuildContext<'_>) -> Result<()> {
        self.run("install", ctx)
    }
}

/// In-memory metadata document
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub coordinate: Rc<RefCell<Option<SourceCoordinate>>>,
}

impl MetadataStore for MemoryStore {
    fn read_coordinate(&self) -> Result<Option<SourceCoordinate>> {
        Ok(self.coordinate.borrow().clone())
    }

    fn write_coordinate(&self, coordinate: &SourceCoordinate) -> Result<()> {
        *self.coordinate.borrow_mut() = Some(coordinate.clone());
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }
}

const CHECKOUT_MARKER: &str = ".fake-checkout";

/// Source control with a fixed remote state
///
/// A checkout writes a marker file holding url and commit into the
/// destination; `current_coordinate` reads it back.
#[derive(Debug, Clone, Default)]
pub struct FakeScm {
    /// What `get_url_and_commit` reports; `None` means "not a checkout"
    pub head: Option<SourceCoordinate>,
    pub log: CallLog,
}

impl FakeScm {
    pub fn at(url: &str, commit: &str) -> Self {
        Self {
            head: Some(SourceCoordinate::new(url, commit)),
            log: CallLog::default(),
        }
    }
}

impl SourceControl for FakeScm {
    fn get_url_and_commit(&self, repo: &Path) -> Result<SourceCoordinate> {
        self.log.push("get_url_and_commit");
        self.head
            .clone()
            .ok_or_else(|| ScmStateError::new(repo, "not a git checkout").into())
    }

    fn checkout(&self, coordinate: &SourceCoordinate, dest: &Path) -> Result<()> {
        self.log.push(format!("checkout {}", coordinate.commit));
        fs::create_dir_all(dest)?;
        fs::write(
            dest.join(CHECKOUT_MARKER),
            format!("{}\n{}\n", coordinate.url, coordinate.commit),
        )?;
        Ok(())
    }

    fn update_submodules(&self, _dest: &Path) -> Result<()> {
        self.log.push("update_submodules");
        Ok(())
    }

    fn current_coordinate(&self, dest: &Path) -> Result<Option<SourceCoordinate>> {
        let content = match fs::read_to_string(dest.join(CHECKOUT_MARKER)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        let mut lines = content.lines();
        match (lines.next(), lines.next()) {
            (Some(url), Some(commit)) => Ok(Some(SourceCoordinate::new(url, commit))),
            _ => Ok(None),
        }
    }
}

/// Fakes handed to an engine, kept by the test for inspection
pub struct Fakes {
    pub scm: FakeScm,
    pub store: MemoryStore,
    pub tool: FakeBuildTool,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            scm: FakeScm::at(UPSTREAM_URL, COMMIT),
            store: MemoryStore::default(),
            tool: FakeBuildTool::default(),
        }
    }

    /// Engine over `recipe_file` wired to clones of these fakes
    pub fn engine(
        &self,
        recipe_file: &Path,
        settings: Settings,
        options: &[(&str, &str)],
        config: EngineConfig,
    ) -> Engine {
        let options = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Engine::load(recipe_file, settings, options, config)
            .unwrap()
            .with_source_control(Box::new(self.scm.clone()))
            .with_metadata_store(Box::new(self.store.clone()))
            .with_build_tool(Box::new(self.tool.clone()))
    }
}

/// Path to git, or `None` when the tests needing it should be skipped
pub fn git_program() -> Option<PathBuf> {
    match which::which("git") {
        Ok(path) => Some(path),
        Err(_) => {
            eprintln!("Skipping: git not installed");
            None
        }
    }
}

/// Run git in `dir` with a throwaway identity, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Ladle Tests",
            "-c",
            "user.email=tests@ladle.invalid",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "protocol.file.allow=always",
        ])
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A working repository holding the raymarch project, pushed to a bare
/// `upstream.git` registered as `origin`
///
/// Returns (TempDir, work folder, upstream url).
pub fn setup_git_project() -> (TempDir, PathBuf, String) {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    fs::create_dir_all(work.join("conan")).unwrap();

    fs::write(work.join("conan").join("recipe.toml"), RAYMARCH_RECIPE).unwrap();
    fs::write(work.join("LICENSE"), "MIT License\n").unwrap();
    fs::write(work.join("CMakeLists.txt"), "project(raymarch CXX)\n").unwrap();
    fs::write(work.join(".gitignore"), "build/\npackage/\n").unwrap();

    git(&work, &["init", "-q"]);
    git(&work, &["add", "."]);
    git(&work, &["commit", "-q", "-m", "Initial import"]);

    let upstream = dir.path().join("upstream.git");
    git(
        dir.path(),
        &["clone", "-q", "--bare", work.to_str().unwrap(), upstream.to_str().unwrap()],
    );

    let url = upstream.display().to_string();
    git(&work, &["remote", "add", "origin", &url]);
    git(&work, &["fetch", "-q", "origin"]);

    (dir, work, url)
}
