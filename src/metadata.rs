// src/metadata.rs

//! Persisted recipe metadata
//!
//! `export` and `source` usually run in different processes, often on
//! different machines. The only thing connecting them is the recipe data
//! document stored next to the recipe, which records the exact source
//! coordinate:
//!
//! ```toml
//! [scm]
//! url = "https://github.com/Adnn/raymarch.git"
//! commit = "0f2a8c1d..."
//! ```
//!
//! Other tables in the document are preserved when the coordinate is
//! rewritten.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File name of the recipe data document
pub const RECIPE_DATA_FILE: &str = "recipedata.toml";

/// Exact provenance of the sources: repository and revision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceCoordinate {
    pub url: String,
    pub commit: String,
}

impl SourceCoordinate {
    pub fn new(url: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            commit: commit.into(),
        }
    }
}

/// Read/write access to the persisted coordinate
///
/// The document is written once by `export` and read any number of times by
/// `source`. Serializing concurrent writers against readers is the host's job.
pub trait MetadataStore {
    /// The stored coordinate, or `None` if nothing was exported yet
    fn read_coordinate(&self) -> Result<Option<SourceCoordinate>>;

    /// Persist the coordinate, replacing any previous one
    fn write_coordinate(&self, coordinate: &SourceCoordinate) -> Result<()>;

    /// Where the document lives, for error messages
    fn location(&self) -> PathBuf;
}

/// TOML document stored next to the recipe
#[derive(Debug, Clone)]
pub struct RecipeDataFile {
    path: PathBuf,
}

impl RecipeDataFile {
    /// The document for the recipe in `recipe_folder`
    pub fn in_folder(recipe_folder: &Path) -> Self {
        Self {
            path: recipe_folder.join(RECIPE_DATA_FILE),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn metadata_error(&self, message: impl Into<String>) -> Error {
        Error::Metadata {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn load_table(&self) -> Result<Option<toml::Table>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        content
            .parse::<toml::Table>()
            .map(Some)
            .map_err(|e| self.metadata_error(format!("invalid document: {}", e)))
    }

    /// Write the whole document through a temporary file in the same folder
    fn store_table(&self, table: &toml::Table) -> Result<()> {
        let rendered = toml::to_string_pretty(table)
            .map_err(|e| self.metadata_error(format!("cannot serialize: {}", e)))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl MetadataStore for RecipeDataFile {
    fn read_coordinate(&self) -> Result<Option<SourceCoordinate>> {
        let table = match self.load_table()? {
            Some(t) => t,
            None => return Ok(None),
        };

        let scm = match table.get("scm") {
            Some(scm) => scm.clone(),
            None => return Ok(None),
        };

        let coordinate: SourceCoordinate = scm
            .try_into()
            .map_err(|e| self.metadata_error(format!("invalid [scm] table: {}", e)))?;
        Ok(Some(coordinate))
    }

    fn write_coordinate(&self, coordinate: &SourceCoordinate) -> Result<()> {
        let mut table = self.load_table()?.unwrap_or_default();

        let scm = toml::Value::try_from(coordinate)
            .map_err(|e| self.metadata_error(format!("cannot serialize coordinate: {}", e)))?;
        table.insert("scm".to_string(), scm);

        debug!(
            "Recording {} @ {} in {}",
            coordinate.url,
            coordinate.commit,
            self.path.display()
        );
        self.store_table(&table)
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}
