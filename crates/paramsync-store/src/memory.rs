use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use paramsync_core::store::ParameterStore;
use paramsync_core::types::ParameterKind;

/// In-process parameter store. Nothing outlives the process.
#[derive(Default)]
pub struct MemoryParameterStore {
    params: Mutex<BTreeMap<String, (String, ParameterKind)>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents keyed by qualified name.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|(name, (value, _))| (name.clone(), value.clone()))
            .collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<ParameterKind> {
        self.lock().get(name).map(|(_, kind)| *kind)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, (String, ParameterKind)>> {
        self.params.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn list(&self, prefix: &str) -> anyhow::Result<BTreeMap<String, String>> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .lock()
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, (value, _))| (name.clone(), value.clone()))
            .collect())
    }

    async fn put(&self, name: &str, value: &str, kind: ParameterKind) -> anyhow::Result<()> {
        self.lock()
            .insert(name.to_string(), (value.to_string(), kind));
        Ok(())
    }

    async fn delete_many(&self, names: &[String]) -> anyhow::Result<()> {
        let mut params = self.lock();
        for name in names {
            params.remove(name);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
