//! Identifier-keyed manifest of produced directories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::registry::CapabilityKind;

/// Maps a strategy identifier to the directory it produced.
///
/// Absent keys mean "not scanned or nothing applicable". Inserting an
/// identifier twice logs an error and keeps the later path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateManifest {
    entries: BTreeMap<String, PathBuf>,
}

impl AggregateManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` under `identifier`, overwriting an earlier entry.
    pub fn insert(&mut self, kind: CapabilityKind, identifier: impl Into<String>, path: PathBuf) {
        let identifier = identifier.into();
        if let Some(previous) = self.entries.insert(identifier.clone(), path) {
            error!(
                %kind,
                identifier = %identifier,
                previous = %previous.display(),
                "Duplicate scanner identifier, keeping the later result"
            );
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&Path> {
        self.entries.get(identifier).map(PathBuf::as_path)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    /// Produced directories, in identifier order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.values().map(PathBuf::as_path)
    }
}
