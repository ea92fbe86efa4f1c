// src/engine/journal.rs

//! Record of completed on-disk stages
//!
//! Stored as JSON under `<build>/.ladle/journal.json`. A journal belongs to
//! one package id and one source coordinate; loading it for a different
//! configuration, or after another commit was exported, starts over.

use super::Stage;
use crate::error::{Error, Result};
use crate::metadata::SourceCoordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const JOURNAL_FILE: &str = "journal.json";

/// One completed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub stage: Stage,
    pub completed_at: DateTime<Utc>,
}

/// Completed stages for one package id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageJournal {
    pub package_id: String,
    /// Coordinate the source folder was populated from
    #[serde(default)]
    pub source: Option<SourceCoordinate>,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
}

impl StageJournal {
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            source: None,
            entries: Vec::new(),
        }
    }

    /// Journal file inside `state_folder`
    pub fn path_in(state_folder: &Path) -> PathBuf {
        state_folder.join(JOURNAL_FILE)
    }

    /// Load the journal for `package_id` and `source`, or start an empty one
    ///
    /// A journal written for another package id, or whose sources came from
    /// another coordinate than the one now exported, is discarded.
    pub fn load_or_new(
        path: &Path,
        package_id: &str,
        source: Option<&SourceCoordinate>,
    ) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new(package_id));
            }
            Err(e) => return Err(e.into()),
        };

        let journal: StageJournal = serde_json::from_str(&content).map_err(|e| Error::Metadata {
            path: path.to_path_buf(),
            message: format!("invalid journal: {}", e),
        })?;

        if journal.package_id != package_id {
            info!(
                "Configuration changed ({} -> {}), starting over",
                short_id(&journal.package_id),
                short_id(package_id)
            );
            return Ok(Self::new(package_id));
        }

        if !journal.entries.is_empty() && journal.source.as_ref() != source {
            info!(
                "Exported sources changed ({} -> {}), starting over",
                journal.source.as_ref().map_or("none", |c| short_id(&c.commit)),
                source.map_or("none", |c| short_id(&c.commit))
            );
            return Ok(Self::new(package_id));
        }

        debug!("Resuming journal at {:?}", journal.last());
        Ok(journal)
    }

    /// Write atomically, creating the folder if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        let rendered = serde_json::to_string_pretty(self).map_err(|e| Error::Metadata {
            path: path.to_path_buf(),
            message: format!("cannot serialize journal: {}", e),
        })?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Last completed stage
    pub fn last(&self) -> Option<Stage> {
        self.entries.iter().map(|e| e.stage).max()
    }

    pub fn has(&self, stage: Stage) -> bool {
        self.entries.iter().any(|e| e.stage == stage)
    }

    /// Mark `stage` complete
    ///
    /// Later stages are dropped: they were produced from the previous
    /// result of `stage` and are stale now.
    pub fn record(&mut self, stage: Stage) {
        self.entries.retain(|e| e.stage < stage);
        self.entries.push(JournalEntry {
            stage,
            completed_at: Utc::now(),
        });
    }
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
