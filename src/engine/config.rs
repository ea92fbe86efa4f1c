// src/engine/config.rs

use crate::recipe::hooks::LicensePolicy;
use std::path::PathBuf;

/// Configuration for the Engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Package folder, instead of `<root>/package`
    pub package_folder: Option<PathBuf>,
    /// Number of parallel jobs
    pub jobs: u32,
    pub cmake_program: PathBuf,
    pub ctest_program: PathBuf,
    pub git_program: PathBuf,
    /// CMake generator; the CMake default when unset
    pub generator: Option<String>,
    /// Force whether target binaries can run (`tools.build.cross_building:can_run`)
    pub can_run: Option<bool>,
    pub license_policy: LicensePolicy,
    /// Never run the test step
    pub skip_tests: bool,
    /// Only export commits that exist on a remote branch
    pub require_pushed: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            package_folder: None,
            jobs,
            cmake_program: PathBuf::from("cmake"),
            ctest_program: PathBuf::from("ctest"),
            git_program: PathBuf::from("git"),
            generator: None,
            can_run: None,
            license_policy: LicensePolicy::default(),
            skip_tests: false,
            require_pushed: true,
        }
    }
}
