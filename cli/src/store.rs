//! Best score kept in a small JSON object on disk, keyed like browser storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tilemerge_core::{GameError, ScoreStore};

pub const DEFAULT_BEST_SCORE_FILE: &str = ".tilemerge-best.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, u32>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid score file {}", self.path.display()))
    }

    fn write_all(&self, values: &BTreeMap<String, u32>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed writing {}", self.path.display()))
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self, key: &str) -> Option<u32> {
        match self.read_all() {
            Ok(values) => values.get(key).copied(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "ignoring unreadable score file");
                None
            }
        }
    }

    fn store(&mut self, key: &str, value: u32) -> Result<(), GameError> {
        // An unreadable file is replaced rather than blocking the write.
        let mut values = self.read_all().unwrap_or_default();
        values.insert(key.to_string(), value);
        self.write_all(&values)
            .map_err(|err| GameError::Storage(format!("{err:#}")))
    }
}
