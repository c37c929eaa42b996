use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::chunk::chunk;
use crate::error::{Result, SyncError};
use crate::keys::ParameterPath;
use crate::progress::{SyncEvent, SyncReporter};

/// A single environment variable as read from a stage file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Local key → value mapping for one stage, after oversized values were chunked.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSnapshot {
    entries: BTreeMap<String, String>,
}

impl LocalSnapshot {
    /// Expand `entries` through the chunker and collect them into a snapshot.
    ///
    /// Every split is reported as a [`SyncEvent::ValueSplit`]. A derived part key that
    /// lands on an already-present key is rejected with [`SyncError::KeyCollision`].
    pub fn from_entries(
        entries: impl IntoIterator<Item = EnvEntry>,
        limit: usize,
        reporter: &dyn SyncReporter,
    ) -> Result<Self> {
        let mut snapshot = BTreeMap::new();

        for entry in entries {
            let source_key = entry.key.clone();
            let parts = chunk(entry, limit);

            if parts.len() > 1 || parts.first().is_some_and(|p| p.key != source_key) {
                reporter.event(SyncEvent::ValueSplit {
                    key: source_key.clone(),
                    parts: parts.len(),
                });
            }

            for part in parts {
                if snapshot.contains_key(&part.key) {
                    return Err(SyncError::KeyCollision {
                        key: part.key,
                        source_key,
                    });
                }
                snapshot.insert(part.key, part.value);
            }
        }

        Ok(Self { entries: snapshot })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Remote key-suffix → value mapping under one stage prefix, as fetched at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    entries: BTreeMap<String, String>,
}

impl RemoteSnapshot {
    /// Build from a store listing keyed by fully qualified names.
    ///
    /// Names outside the stage prefix are skipped.
    pub fn from_listing(path: &ParameterPath, listing: BTreeMap<String, String>) -> Self {
        let mut entries = BTreeMap::new();
        for (name, value) in listing {
            match path.strip(&name) {
                Some(key) => {
                    entries.insert(key.to_string(), value);
                }
                None => {
                    tracing::debug!(name = %name, prefix = %path.prefix(), "Skipping parameter outside prefix");
                }
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl FromIterator<(String, String)> for RemoteSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Remote keys with no local counterpart, computed once per run.
pub type DeletionSet = BTreeSet<String>;

/// Parameter type written to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    #[default]
    String,
    SecureString,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::String => write!(f, "String"),
            ParameterKind::SecureString => write!(f, "SecureString"),
        }
    }
}

impl std::str::FromStr for ParameterKind {
    type Err = SyncError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(ParameterKind::String),
            "securestring" | "secure-string" | "secure" => Ok(ParameterKind::SecureString),
            other => Err(SyncError::Config(format!("Unknown parameter type: {other}"))),
        }
    }
}

/// Which backend holds the parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// AWS Systems Manager Parameter Store.
    #[default]
    Ssm,
    /// JSON file on disk, for offline use.
    Local,
    /// Process memory; contents are lost on exit.
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Ssm => write!(f, "ssm"),
            StoreKind::Local => write!(f, "local"),
            StoreKind::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StoreKind {
    type Err = SyncError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssm" | "aws" | "aws-ssm" => Ok(StoreKind::Ssm),
            "local" | "file" => Ok(StoreKind::Local),
            "memory" => Ok(StoreKind::Memory),
            other => Err(SyncError::Config(format!("Unknown store type: {other}"))),
        }
    }
}
