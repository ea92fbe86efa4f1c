// src/error.rs

//! Error types for recipe evaluation
//!
//! Validation failures are all `ConfigError`s and are raised before any
//! external command runs. Failures of the external build tool are carried
//! verbatim in `BuildToolError`.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for recipe operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing option/settings combination
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source-control query failed while exporting
    #[error("{0}")]
    ScmState(#[from] ScmStateError),

    /// `source` ran before any coordinate was exported
    #[error("{0}")]
    MissingCoordinate(#[from] MissingCoordinateError),

    /// Fetching the recorded coordinate into the source folder failed
    #[error("checkout of {url} at {commit} failed: {reason}")]
    Checkout {
        url: String,
        commit: String,
        reason: String,
    },

    /// The source folder holds uncommitted work a checkout would overwrite
    #[error("{0}")]
    DirtyCheckout(#[from] DirtyCheckoutError),

    /// The external build tool failed
    #[error("{0}")]
    BuildTool(#[from] BuildToolError),

    /// License file required by policy was not found
    #[error("{0}")]
    MissingLicense(#[from] MissingLicenseError),

    /// A hook was invoked before the stage it depends on
    #[error("cannot run {hook}: stage {required} has not completed (last completed: {current})")]
    Stage {
        hook: &'static str,
        required: String,
        current: String,
    },

    /// Recipe or profile could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Recipe metadata document could not be read or written
    #[error("metadata error in {}: {message}", .path.display())]
    Metadata { path: PathBuf, message: String },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by option/settings validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("current C++ standard ({got}) is lower than required C++ standard ({required})")]
    UnsupportedStandard { required: String, got: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{name}' does not accept '{value}' (allowed: {allowed})")]
    InvalidOptionValue {
        name: String,
        value: String,
        allowed: String,
    },

    #[error("option '{0}' was removed for this configuration")]
    OptionAbsent(String),

    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("requirement '{0}' is declared more than once")]
    DuplicateRequirement(String),

    #[error("invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },
}

/// Export-time failure to read the recipe checkout
#[derive(Error, Debug)]
#[error("cannot capture source coordinates of {}: {reason}", .root.display())]
pub struct ScmStateError {
    pub root: PathBuf,
    pub reason: String,
}

impl ScmStateError {
    pub fn new(root: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            reason: reason.into(),
        }
    }
}

/// No coordinate has been persisted for this recipe
#[derive(Error, Debug)]
#[error(
    "no source coordinate recorded in {}; run `export` on the recipe checkout first",
    .metadata.display()
)]
pub struct MissingCoordinateError {
    pub metadata: PathBuf,
}

/// Source folder with local changes that `source` refuses to touch
#[derive(Error, Debug)]
#[error(
    "refusing to check out into {}: uncommitted changes in {}",
    .folder.display(),
    .paths.join(", ")
)]
pub struct DirtyCheckoutError {
    pub folder: PathBuf,
    pub paths: Vec<String>,
}

/// Failure reported by the external build tool, unmodified
#[derive(Debug)]
pub struct BuildToolError {
    pub program: String,
    pub phase: String,
    pub code: Option<i32>,
    pub stderr: String,
}

impl fmt::Display for BuildToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(
                f,
                "{} {} failed with exit code {}",
                self.program, self.phase, code
            )?,
            None => write!(f, "{} {} was terminated by a signal", self.program, self.phase)?,
        }
        if !self.stderr.is_empty() {
            write!(f, "\nstderr: {}", self.stderr)?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildToolError {}

/// Mandatory license file is missing from the source folder
#[derive(Error, Debug)]
#[error("license file {} not found (license is mandatory)", .path.display())]
pub struct MissingLicenseError {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_standard_message() {
        let err = ConfigError::UnsupportedStandard {
            required: "20".to_string(),
            got: "17".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("20"));
        assert!(msg.contains("17"));
    }

    #[test]
    fn test_missing_coordinate_is_not_io() {
        let err: Error = MissingCoordinateError {
            metadata: PathBuf::from("/recipe/recipedata.toml"),
        }
        .into();
        assert!(matches!(err, Error::MissingCoordinate(_)));
        assert!(err.to_string().contains("export"));
    }

    #[test]
    fn test_build_tool_error_keeps_stderr() {
        let err = BuildToolError {
            program: "cmake".to_string(),
            phase: "configure".to_string(),
            code: Some(1),
            stderr: "CMake Error at CMakeLists.txt:3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"));
        assert!(msg.ends_with("CMake Error at CMakeLists.txt:3"));
    }
}
