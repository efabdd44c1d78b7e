//! Level Library
//!
//! Where numbered levels come from. Levels are 1-based and, on disk, live
//! at `<root>/level{n}.json`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::document::LevelDocument;
use super::parser::{parse, ParseError, ParsedLevel};

/// Failure to produce a parsed level for an index.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source has no level with this index
    #[error("level {0} not found")]
    NotFound(u32),

    /// The level exists but could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The level was read but is not a valid level
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A provider of raw level documents.
pub trait LevelSource {
    /// Raw JSON text for level `index`.
    fn read(&self, index: u32) -> Result<String, LoadError>;

    /// Whether level `index` exists.
    fn contains(&self, index: u32) -> bool;
}

/// Levels stored as `level{n}.json` files in a directory.
#[derive(Clone, Debug)]
pub struct DirLevelSource {
    root: PathBuf,
}

impl DirLevelSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of level `index`.
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.root.join(format!("level{}.json", index))
    }
}

impl LevelSource for DirLevelSource {
    fn read(&self, index: u32) -> Result<String, LoadError> {
        let path = self.path_for(index);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(LoadError::NotFound(index)),
            Err(source) => Err(LoadError::Io { path, source }),
        }
    }

    fn contains(&self, index: u32) -> bool {
        self.path_for(index).is_file()
    }
}

/// Levels held in memory, keyed by index.
#[derive(Clone, Debug, Default)]
pub struct MemoryLevelSource {
    levels: BTreeMap<u32, String>,
}

impl MemoryLevelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add raw JSON text for a level.
    pub fn insert_json(&mut self, index: u32, json: impl Into<String>) {
        self.levels.insert(index, json.into());
    }

    /// Add a level from a document.
    pub fn insert(&mut self, index: u32, doc: &LevelDocument) -> Result<(), ParseError> {
        self.levels.insert(index, doc.to_json()?);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for tile rows.
    pub fn with_rows(mut self, index: u32, tile_size: i64, rows: &[&str]) -> Self {
        let doc = LevelDocument {
            tile_size,
            tiles: rows.iter().map(|r| r.to_string()).collect(),
        };
        if let Err(e) = self.insert(index, &doc) {
            warn!(index, error = %e, "level rows could not be encoded");
        }
        self
    }
}

impl LevelSource for MemoryLevelSource {
    fn read(&self, index: u32) -> Result<String, LoadError> {
        self.levels.get(&index).cloned().ok_or(LoadError::NotFound(index))
    }

    fn contains(&self, index: u32) -> bool {
        self.levels.contains_key(&index)
    }
}

/// Read, decode and parse level `index`.
pub fn load_level(source: &dyn LevelSource, index: u32) -> Result<ParsedLevel, LoadError> {
    let text = source.read(index)?;
    let doc = LevelDocument::from_json(&text)?;
    let level = parse(&doc.to_grid()?)?;
    debug!(index, "level loaded");
    Ok(level)
}
