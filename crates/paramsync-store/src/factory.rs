//! Factory for creating the appropriate ParameterStore based on configuration.

use std::path::Path;

use paramsync_core::store::ParameterStore;
use paramsync_core::types::StoreKind;

use crate::local::LocalParameterStore;
use crate::memory::MemoryParameterStore;

/// Connection settings gathered from config file and CLI flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreOptions<'a> {
    pub region: Option<&'a str>,
    pub endpoint_url: Option<&'a str>,
    pub access_key: Option<&'a str>,
    pub secret_key: Option<&'a str>,
    /// File backing the local store.
    pub store_path: Option<&'a str>,
}

/// Create a ParameterStore for `kind`.
///
/// Supported kinds:
/// - `ssm` (AWS SSM Parameter Store, compile with the `ssm` feature)
/// - `local` (JSON file, requires `store_path`)
/// - `memory` (process-local, for dry experiments)
#[allow(unused_variables)]
pub async fn create_store(
    kind: StoreKind,
    opts: StoreOptions<'_>,
) -> anyhow::Result<Box<dyn ParameterStore>> {
    match kind {
        #[cfg(feature = "ssm")]
        StoreKind::Ssm => {
            let store = crate::ssm::SsmParameterStore::with_options(crate::ssm::SsmOptions {
                region: opts.region,
                endpoint_url: opts.endpoint_url,
                access_key: opts.access_key,
                secret_key: opts.secret_key,
            })
            .await?;
            Ok(Box::new(store))
        }

        #[cfg(not(feature = "ssm"))]
        StoreKind::Ssm => {
            anyhow::bail!("ssm feature not enabled. Recompile with --features ssm")
        }

        StoreKind::Local => {
            let path = opts
                .store_path
                .ok_or_else(|| anyhow::anyhow!("store_path required for local store"))?;
            Ok(Box::new(LocalParameterStore::new(Path::new(path), "local")?))
        }

        StoreKind::Memory => Ok(Box::new(MemoryParameterStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn local_requires_path() {
        let result = create_store(StoreKind::Local, StoreOptions::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn creates_local_store() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("params.json");
        let store = create_store(
            StoreKind::Local,
            StoreOptions {
                store_path: path.to_str(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(store.name(), "local");
    }

    #[tokio::test]
    async fn creates_memory_store() {
        let store = create_store(StoreKind::Memory, StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(store.name(), "memory");
    }
}
