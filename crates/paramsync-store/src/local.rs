use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use paramsync_core::store::ParameterStore;
use paramsync_core::types::ParameterKind;

/// Parameter store backed by a single JSON file, for offline use and demos.
pub struct LocalParameterStore {
    path: PathBuf,
    name: String,
    // Serialises read-modify-write cycles on the file.
    guard: Mutex<()>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredParameter {
    value: String,
    #[serde(rename = "type")]
    kind: ParameterKind,
}

impl LocalParameterStore {
    pub fn new(path: &Path, name: &str) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            name: name.to_string(),
            guard: Mutex::new(()),
        })
    }

    fn read(&self) -> anyhow::Result<BTreeMap<String, StoredParameter>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Corrupt store file {}: {e}", self.path.display()))
    }

    fn write(&self, params: &BTreeMap<String, StoredParameter>) -> anyhow::Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(params)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn modify<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, StoredParameter>),
    {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| anyhow::anyhow!("Store lock poisoned"))?;
        let mut params = self.read()?;
        f(&mut params);
        self.write(&params)
    }
}

#[async_trait]
impl ParameterStore for LocalParameterStore {
    async fn list(&self, prefix: &str) -> anyhow::Result<BTreeMap<String, String>> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .read()?
            .into_iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, p)| (name, p.value))
            .collect())
    }

    async fn put(&self, name: &str, value: &str, kind: ParameterKind) -> anyhow::Result<()> {
        self.modify(|params| {
            params.insert(
                name.to_string(),
                StoredParameter {
                    value: value.to_string(),
                    kind,
                },
            );
        })
    }

    async fn delete_many(&self, names: &[String]) -> anyhow::Result<()> {
        self.modify(|params| {
            for name in names {
                if params.remove(name).is_none() {
                    tracing::warn!(name = %name, "Parameter to delete was not present");
                }
            }
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
