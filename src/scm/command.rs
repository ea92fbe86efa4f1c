// src/scm/command.rs

//! Builder for git invocations
//!
//! All git calls go through [`GitCommand`] so that every invocation is
//! logged the same way and failures carry the captured stderr.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, trace};

/// Output of a git command that exited successfully
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Failure of a git command
#[derive(Debug, Clone)]
pub struct GitFailure {
    /// The arguments that were passed, for diagnostics
    pub command: String,
    pub code: Option<i32>,
    pub stderr: String,
}

impl std::fmt::Display for GitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "`{}` exited with {}", self.command, code)?,
            None => write!(f, "`{}` could not be run", self.command)?,
        }
        if !self.stderr.is_empty() {
            write!(f, ": {}", self.stderr.trim())?;
        }
        Ok(())
    }
}

/// Fluent construction of a single git invocation
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
}

impl GitCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
        }
    }

    /// Run inside `dir` (passed to git as `-C dir`)
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    fn full_args(&self) -> Vec<String> {
        let mut full = Vec::with_capacity(self.args.len() + 2);
        if let Some(dir) = &self.current_dir {
            full.push("-C".to_string());
            full.push(dir.display().to_string());
        }
        full.extend(self.args.iter().cloned());
        full
    }

    /// Run and require a zero exit status
    pub fn execute(self) -> Result<GitOutput, GitFailure> {
        let full_args = self.full_args();
        let rendered = format!("git {}", full_args.join(" "));
        debug!(target: "git", "Executing command: {}", rendered);

        let mut cmd = Command::new(&self.program);
        cmd.args(&full_args);
        for (key, value) in &self.env_vars {
            trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        let output: Output = cmd.output().map_err(|e| GitFailure {
            command: rendered.clone(),
            code: None,
            stderr: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(GitFailure {
                command: rendered,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(GitOutput { stdout, stderr })
    }

    /// Run and return trimmed stdout
    pub fn execute_stdout(self) -> Result<String, GitFailure> {
        self.execute().map(|o| o.stdout.trim().to_string())
    }
}
