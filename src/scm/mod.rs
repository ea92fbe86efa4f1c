// src/scm/mod.rs

//! Source-control access
//!
//! The recipe talks to source control through [`SourceControl`] only:
//! capture `(url, commit)` of the recipe checkout at export time, and later
//! reproduce that exact tree (including nested submodules) in the source
//! folder. [`Git`] implements it by running the `git` executable.

mod command;

pub use command::{GitCommand, GitFailure, GitOutput};

use crate::error::{DirtyCheckoutError, Error, Result, ScmStateError};
use crate::metadata::{SourceCoordinate, RECIPE_DATA_FILE};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Operations the recipe needs from source control
pub trait SourceControl {
    /// Remote URL and current commit of the checkout containing `repo`
    ///
    /// Fails with `ScmStateError` if `repo` is not inside a checkout, no
    /// remote is configured, or the tree cannot be reproduced from a commit.
    fn get_url_and_commit(&self, repo: &Path) -> Result<SourceCoordinate>;

    /// Place the tree at `coordinate` into `dest`
    fn checkout(&self, coordinate: &SourceCoordinate, dest: &Path) -> Result<()>;

    /// Recursively initialize and update nested checkouts in `dest`
    fn update_submodules(&self, dest: &Path) -> Result<()>;

    /// The coordinate `dest` is currently checked out at, if it is a checkout
    fn current_coordinate(&self, dest: &Path) -> Result<Option<SourceCoordinate>>;
}

/// [`SourceControl`] backed by the git command line
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
    /// Require the exported commit to be reachable from a remote branch
    require_pushed: bool,
}

impl Git {
    /// Locate `git` on `PATH`
    pub fn from_path() -> Result<Self> {
        let program = which::which("git").map_err(|e| {
            Error::ScmState(ScmStateError::new(".", format!("git executable not found: {}", e)))
        })?;
        Ok(Self::with_program(program))
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            require_pushed: true,
        }
    }

    /// Allow exporting commits that exist only locally
    pub fn allow_unpushed(mut self) -> Self {
        self.require_pushed = false;
        self
    }

    fn git(&self) -> GitCommand {
        // Never block on a credential prompt
        GitCommand::new(&self.program).env("GIT_TERMINAL_PROMPT", "0")
    }

    /// Remote to record: `origin` if present, otherwise the first one
    fn pick_remote(&self, repo: &Path) -> std::result::Result<Option<String>, GitFailure> {
        let remotes = self.git().current_dir(repo).arg("remote").execute_stdout()?;
        let names: Vec<&str> = remotes.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if names.contains(&"origin") {
            return Ok(Some("origin".to_string()));
        }
        Ok(names.first().map(|s| s.to_string()))
    }

    /// Uncommitted changes anywhere in the repository containing `repo`
    ///
    /// The recipe data document is ignored: export writes it after the
    /// commit it records.
    fn dirty_paths(&self, repo: &Path) -> std::result::Result<Vec<String>, GitFailure> {
        let status = self
            .git()
            .current_dir(repo)
            .args(["status", "--porcelain", "--untracked-files=normal"])
            .execute()?;

        Ok(status
            .stdout
            .lines()
            .filter(|l| l.len() > 3)
            .map(|l| l[3..].trim().to_string())
            .filter(|p| !p.ends_with(RECIPE_DATA_FILE))
            .collect())
    }

    fn commit_in_remote(&self, repo: &Path, commit: &str) -> std::result::Result<bool, GitFailure> {
        let branches = self
            .git()
            .current_dir(repo)
            .args(["branch", "-r", "--contains", commit])
            .execute_stdout()?;
        Ok(!branches.is_empty())
    }
}

impl SourceControl for Git {
    fn get_url_and_commit(&self, repo: &Path) -> Result<SourceCoordinate> {
        let scm_error = |reason: String| Error::ScmState(ScmStateError::new(repo, reason));

        self.git()
            .current_dir(repo)
            .args(["rev-parse", "--show-toplevel"])
            .execute_stdout()
            .map_err(|e| scm_error(format!("not a git checkout ({})", e)))?;

        let commit = self
            .git()
            .current_dir(repo)
            .args(["rev-parse", "HEAD"])
            .execute_stdout()
            .map_err(|e| scm_error(format!("no commit checked out ({})", e)))?;

        let dirty = self.dirty_paths(repo).map_err(|e| scm_error(e.to_string()))?;
        if !dirty.is_empty() {
            return Err(scm_error(format!(
                "working tree has uncommitted changes: {}",
                dirty.join(", ")
            )));
        }

        let remote = self
            .pick_remote(repo)
            .map_err(|e| scm_error(e.to_string()))?
            .ok_or_else(|| scm_error("no remote configured".to_string()))?;

        let url = self
            .git()
            .current_dir(repo)
            .args(["remote", "get-url", remote.as_str()])
            .execute_stdout()
            .map_err(|e| scm_error(e.to_string()))?;

        if self.require_pushed
            && !self
                .commit_in_remote(repo, &commit)
                .map_err(|e| scm_error(e.to_string()))?
        {
            return Err(scm_error(format!(
                "commit {} is not present in any branch of remote '{}'",
                commit, remote
            )));
        }

        let url = strip_credentials(&url);
        debug!("Captured {} @ {}", url, commit);
        Ok(SourceCoordinate { url, commit })
    }

    fn checkout(&self, coordinate: &SourceCoordinate, dest: &Path) -> Result<()> {
        let checkout_error = |reason: String| Error::Checkout {
            url: coordinate.url.clone(),
            commit: coordinate.commit.clone(),
            reason,
        };

        if !dest.join(".git").exists() {
            fs::create_dir_all(dest)?;
            info!("Cloning {} into {}", coordinate.url, dest.display());
            self.git()
                .args(["clone", "--no-checkout", coordinate.url.as_str()])
                .arg(dest.display().to_string())
                .execute()
                .map_err(|e| checkout_error(e.to_string()))?;
        } else {
            // Local work in a reused checkout is never overwritten
            let dirty = self
                .dirty_paths(dest)
                .map_err(|e| checkout_error(e.to_string()))?;
            if !dirty.is_empty() {
                return Err(DirtyCheckoutError {
                    folder: dest.to_path_buf(),
                    paths: dirty,
                }
                .into());
            }
            debug!("Reusing existing checkout in {}", dest.display());
        }

        // The commit may be missing from a reused clone
        let has_commit = self
            .git()
            .current_dir(dest)
            .args(["cat-file", "-e"])
            .arg(format!("{}^{{commit}}", coordinate.commit))
            .execute()
            .is_ok();
        if !has_commit {
            self.git()
                .current_dir(dest)
                .args(["fetch", coordinate.url.as_str(), coordinate.commit.as_str()])
                .execute()
                .map_err(|e| checkout_error(e.to_string()))?;
        }

        info!("Checking out {}", coordinate.commit);
        self.git()
            .current_dir(dest)
            .args(["checkout", "--detach", coordinate.commit.as_str()])
            .execute()
            .map_err(|e| checkout_error(e.to_string()))?;

        Ok(())
    }

    fn update_submodules(&self, dest: &Path) -> Result<()> {
        info!("Updating submodules in {}", dest.display());
        self.git()
            .current_dir(dest)
            .args(["submodule", "update", "--init", "--recursive"])
            .execute()
            .map_err(|e| Error::Checkout {
                url: dest.display().to_string(),
                commit: "HEAD".to_string(),
                reason: format!("submodule update failed: {}", e),
            })?;
        Ok(())
    }

    fn current_coordinate(&self, dest: &Path) -> Result<Option<SourceCoordinate>> {
        if !dest.join(".git").exists() {
            return Ok(None);
        }

        let commit = match self
            .git()
            .current_dir(dest)
            .args(["rev-parse", "HEAD"])
            .execute_stdout()
        {
            Ok(c) => c,
            Err(_) => return Ok(None),
        };

        let remote = match self.pick_remote(dest) {
            Ok(Some(r)) => r,
            _ => return Ok(None),
        };

        match self
            .git()
            .current_dir(dest)
            .args(["remote", "get-url", remote.as_str()])
            .execute_stdout()
        {
            Ok(url) => Ok(Some(SourceCoordinate {
                url: strip_credentials(&url),
                commit,
            })),
            Err(_) => Ok(None),
        }
    }
}

/// Drop user/password from http(s) URLs before they are persisted
///
/// scp-like remotes (`git@host:org/repo.git`) and local paths are returned
/// unchanged.
pub fn strip_credentials(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed)
            if matches!(parsed.scheme(), "http" | "https")
                && (!parsed.username().is_empty() || parsed.password().is_some()) =>
        {
            // Both setters only fail for cannot-be-a-base URLs, excluded above
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
