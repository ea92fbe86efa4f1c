// src/buildtool/toolchain.rs

//! CMake toolchain file generation
//!
//! The profile definitions are written to `<generators>/ladle_toolchain.cmake`
//! so that a developer re-running CMake by hand gets the same configuration
//! as the recipe.

use crate::error::Result;
use crate::profile::BuildProfile;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TOOLCHAIN_FILE: &str = "ladle_toolchain.cmake";

/// Render the toolchain file contents for `profile`
pub fn render_toolchain(profile: &BuildProfile, generators_folder: &Path) -> String {
    let mut out = String::new();
    out.push_str("# Generated by ladle. Do not edit, changes are overwritten.\n");
    out.push_str("include_guard()\n\n");

    for def in profile.definitions() {
        // Single-config generators read the build type from the cache
        if def.name == "CMAKE_BUILD_TYPE" {
            let _ = writeln!(
                out,
                "set({} \"{}\" CACHE STRING \"Build type\" FORCE)",
                def.name,
                escape(&def.value)
            );
        } else {
            let _ = writeln!(out, "set({} \"{}\")", def.name, escape(&def.value));
        }
    }

    let _ = writeln!(
        out,
        "\nlist(PREPEND CMAKE_PREFIX_PATH \"{}\")",
        escape(&cmake_path(generators_folder))
    );
    out
}

/// Write the toolchain file and return its path
pub fn write_toolchain(profile: &BuildProfile, generators_folder: &Path) -> Result<PathBuf> {
    fs::create_dir_all(generators_folder)?;
    let path = generators_folder.join(TOOLCHAIN_FILE);
    fs::write(&path, render_toolchain(profile, generators_folder))?;
    debug!("Wrote toolchain {}", path.display());
    Ok(path)
}

/// CMake wants forward slashes on every platform
fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
