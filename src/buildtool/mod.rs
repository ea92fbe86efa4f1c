// src/buildtool/mod.rs

//! External build tool interface
//!
//! The recipe never builds anything itself; it asks a [`BuildTool`] to
//! configure, build, test and install, and passes any failure back
//! unchanged.

mod cmake;
mod toolchain;

pub use cmake::CMake;
pub use toolchain::{write_toolchain, TOOLCHAIN_FILE};

use crate::error::{BuildToolError, Result};
use crate::layout::Layout;
use crate::profile::BuildProfile;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Everything a build tool invocation needs to know
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub layout: &'a Layout,
    pub profile: &'a BuildProfile,
    /// Parallel jobs for the build step
    pub jobs: u32,
}

/// The four opaque commands a recipe drives
pub trait BuildTool {
    fn configure(&self, ctx: &BuildContext<'_>) -> Result<()>;
    fn build(&self, ctx: &BuildContext<'_>) -> Result<()>;
    fn test(&self, ctx: &BuildContext<'_>) -> Result<()>;
    fn install(&self, ctx: &BuildContext<'_>) -> Result<()>;
}

/// Run one external command, surfacing failure as `BuildToolError`
pub(crate) fn run_tool(program: &Path, phase: &str, args: &[String], workdir: &Path) -> Result<()> {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.display().to_string());

    info!("Running {} phase", phase);
    debug!("Command: {} {}", program.display(), args.join(" "));

    let output = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .output()
        .map_err(|e| BuildToolError {
            program: name.clone(),
            phase: phase.to_string(),
            code: None,
            stderr: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stdout.lines() {
        debug!(target: "buildtool", "{}", line);
    }

    if !output.status.success() {
        return Err(BuildToolError {
            program: name,
            phase: phase.to_string(),
            code: output.status.code(),
            stderr: stderr.to_string(),
        }
        .into());
    }

    Ok(())
}
