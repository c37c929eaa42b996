use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::types::ParameterKind;

/// Trait for remote key-value parameter stores.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// All parameters under `prefix`, recursively, keyed by fully qualified name.
    /// Values are returned decrypted.
    async fn list(&self, prefix: &str) -> anyhow::Result<BTreeMap<String, String>>;

    /// Create or overwrite a single parameter.
    async fn put(&self, name: &str, value: &str, kind: ParameterKind) -> anyhow::Result<()>;

    /// Remove a batch of parameters in one request.
    async fn delete_many(&self, names: &[String]) -> anyhow::Result<()>;

    /// Store name for display.
    fn name(&self) -> &str;
}
