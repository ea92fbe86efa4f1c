// src/buildtool/cmake.rs

//! CMake driver

use super::{run_tool, write_toolchain, BuildContext, BuildTool};
use crate::error::{BuildToolError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs `cmake` and `ctest`
#[derive(Debug, Clone)]
pub struct CMake {
    cmake: PathBuf,
    ctest: PathBuf,
    generator: Option<String>,
}

impl CMake {
    /// Locate `cmake` and `ctest` on `PATH`
    pub fn from_path() -> Result<Self> {
        let lookup = |tool: &str| {
            which::which(tool).map_err(|e| BuildToolError {
                program: tool.to_string(),
                phase: "lookup".to_string(),
                code: None,
                stderr: e.to_string(),
            })
        };
        Ok(Self {
            cmake: lookup("cmake")?,
            ctest: lookup("ctest")?,
            generator: None,
        })
    }

    /// Use explicit program paths
    pub fn with_programs(cmake: impl Into<PathBuf>, ctest: impl Into<PathBuf>) -> Self {
        Self {
            cmake: cmake.into(),
            ctest: ctest.into(),
            generator: None,
        }
    }

    /// Select a CMake generator (`-G`)
    pub fn with_generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    /// Version reported by `cmake --version`, e.g. `3.28.1`
    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.cmake).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        parse_version_output(&String::from_utf8_lossy(&output.stdout))
    }

    pub(crate) fn configure_args(&self, ctx: &BuildContext<'_>, toolchain: &Path) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            ctx.layout.source_folder.display().to_string(),
            "-B".to_string(),
            ctx.layout.build_folder.display().to_string(),
        ];
        if let Some(generator) = &self.generator {
            args.push("-G".to_string());
            args.push(generator.clone());
        }
        args.push(format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain.display()));
        args.push(format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            ctx.layout.package_folder.display()
        ));
        for def in ctx.profile.definitions() {
            args.push(format!("-D{}={}", def.name, def.value));
        }
        args
    }

    pub(crate) fn build_args(&self, ctx: &BuildContext<'_>) -> Vec<String> {
        vec![
            "--build".to_string(),
            ctx.layout.build_folder.display().to_string(),
            "--config".to_string(),
            ctx.profile.build_type().to_string(),
            "--parallel".to_string(),
            ctx.jobs.to_string(),
        ]
    }

    pub(crate) fn test_args(&self, ctx: &BuildContext<'_>) -> Vec<String> {
        vec![
            "--test-dir".to_string(),
            ctx.layout.build_folder.display().to_string(),
            "-C".to_string(),
            ctx.profile.build_type().to_string(),
            "--output-on-failure".to_string(),
        ]
    }

    pub(crate) fn install_args(&self, ctx: &BuildContext<'_>) -> Vec<String> {
        vec![
            "--install".to_string(),
            ctx.layout.build_folder.display().to_string(),
            "--config".to_string(),
            ctx.profile.build_type().to_string(),
            "--prefix".to_string(),
            ctx.layout.package_folder.display().to_string(),
        ]
    }
}

impl BuildTool for CMake {
    fn configure(&self, ctx: &BuildContext<'_>) -> Result<()> {
        std::fs::create_dir_all(&ctx.layout.build_folder)?;
        let toolchain = write_toolchain(ctx.profile, &ctx.layout.generators_folder)?;
        let args = self.configure_args(ctx, &toolchain);
        run_tool(&self.cmake, "configure", &args, &ctx.layout.build_folder)
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        run_tool(&self.cmake, "build", &self.build_args(ctx), &ctx.layout.build_folder)
    }

    fn test(&self, ctx: &BuildContext<'_>) -> Result<()> {
        run_tool(&self.ctest, "test", &self.test_args(ctx), &ctx.layout.build_folder)
    }

    fn install(&self, ctx: &BuildContext<'_>) -> Result<()> {
        std::fs::create_dir_all(&ctx.layout.package_folder)?;
        run_tool(&self.cmake, "install", &self.install_args(ctx), &ctx.layout.build_folder)
    }
}

/// Extract the version from `cmake version 3.28.1` style output
fn parse_version_output(output: &str) -> Option<String> {
    output
        .lines()
        .next()?
        .split_whitespace()
        .find(|word| word.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .map(str::to_string)
}
