//! Persisted class-name → unit-path registry.

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Registry mapping a fully-qualified class name to the unit that now
/// defines it. Built by a weave pass, then frozen; the resolver only
/// reads it. A class with no contributions never appears here, so lookups
/// for it fall through to the original source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassMap {
    entries: IndexMap<String, PathBuf>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_name: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(class_name.into(), path.into());
    }

    pub fn get(&self, class_name: &str) -> Option<&Path> {
        self.entries.get(class_name).map(PathBuf::as_path)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.entries.contains_key(class_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    /// Loads a previously stored map.
    ///
    /// A missing cache file, or one that no longer parses, means "no
    /// cache" and forces a fresh weave; only unexpected I/O failures
    /// propagate.
    pub fn load(path: &Path) -> Result<Option<ClassMap>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(Some(map)),
            Err(err) => {
                warn!(
                    "ignoring unreadable class map cache at {}: {err}",
                    path.display()
                );
                Ok(None)
            }
        }
    }

    /// Stores the map as pretty JSON.
    ///
    /// The serialized form goes to a temporary file in the same directory
    /// and replaces the target by rename, so a reader never observes a
    /// half-written map.
    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
