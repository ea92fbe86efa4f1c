// src/layout.rs

//! On-disk folder layout for a recipe evaluation
//!
//! The layout is derived from the recipe location and a root override only.
//! Settings and options never influence it, so every configuration of the
//! same recipe agrees on where sources live.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Source, build, generators and package folders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub root: PathBuf,
    pub source_folder: PathBuf,
    pub build_folder: PathBuf,
    pub generators_folder: PathBuf,
    pub package_folder: PathBuf,
}

impl Layout {
    /// Compute the layout for a recipe living in `recipe_folder`
    ///
    /// `layout_root` is relative to the recipe folder (`..` places the
    /// project root one directory above it). `package_folder` overrides the
    /// default `<root>/package`.
    pub fn compute(
        recipe_folder: &Path,
        layout_root: &Path,
        package_folder: Option<&Path>,
    ) -> Self {
        let root = normalize(&recipe_folder.join(layout_root));
        let build_folder = root.join("build");
        let generators_folder = build_folder.join("generators");
        let package_folder = match package_folder {
            Some(p) if p.is_absolute() => normalize(p),
            Some(p) => normalize(&root.join(p)),
            None => root.join("package"),
        };

        Self {
            source_folder: root.clone(),
            root,
            build_folder,
            generators_folder,
            package_folder,
        }
    }

    /// Folder where license files are packaged
    pub fn licenses_folder(&self) -> PathBuf {
        self.package_folder.join("licenses")
    }

    /// Folder for engine bookkeeping
    pub fn state_folder(&self) -> PathBuf {
        self.build_folder.join(".ladle")
    }
}

/// Resolve `.` and `..` lexically, without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
