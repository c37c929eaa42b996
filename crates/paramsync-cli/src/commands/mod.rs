pub mod config;
pub mod pull;
pub mod push;

use anyhow::Result;
use std::path::PathBuf;

use paramsync_core::config::ParamsyncConfig;
use paramsync_core::keys::ParameterPath;
use paramsync_core::store::ParameterStore;
use paramsync_core::sync::SyncOptions;
use paramsync_core::types::StoreKind;
use paramsync_store::factory::{StoreOptions, create_store};

use crate::ConnectionArgs;

/// Everything a command needs, merged from CLI flags, environment and config file.
///
/// Flags and their environment fallbacks win over `paramsync.toml`.
pub struct RunContext {
    pub path: ParameterPath,
    pub env_dir: PathBuf,
    pub chunk_limit: usize,
    pub options: SyncOptions,
    pub store_kind: StoreKind,
    region: Option<String>,
    endpoint_url: Option<String>,
    access_key: Option<String>,
    secret_key: Option<String>,
    store_path: Option<String>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("path", &self.path)
            .field("env_dir", &self.env_dir)
            .field("store_kind", &self.store_kind)
            .field("region", &self.region)
            .field("access_key", &self.access_key.as_ref().map(|_| "[REDACTED]"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RunContext {
    pub fn resolve(config: &ParamsyncConfig, stage: &str, conn: &ConnectionArgs) -> Result<Self> {
        let settings = &config.paramsync;

        let app_name = conn
            .app_name
            .as_deref()
            .or(settings.app_name.as_deref())
            .ok_or_else(|| {
                anyhow::anyhow!("Application name not set: pass --app-name, set APP_NAME or app_name in paramsync.toml")
            })?;
        let path = ParameterPath::new(app_name, stage)?;

        let env_dir = conn
            .env_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&settings.env_dir));

        let store_kind = conn.store.unwrap_or(settings.store);
        if store_kind == StoreKind::Memory {
            anyhow::bail!("The memory store does not outlive the process; use --store ssm or local");
        }

        let store_path = conn
            .store_path
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| settings.store_path.clone());

        Ok(Self {
            path,
            env_dir,
            chunk_limit: settings.chunk_limit,
            options: config.sync_options(),
            store_kind,
            region: conn.region.clone().or_else(|| settings.region.clone()),
            endpoint_url: settings.endpoint_url.clone(),
            access_key: conn.access_key.clone(),
            secret_key: conn.secret_key.clone(),
            store_path,
        })
    }

    pub async fn open_store(&self) -> Result<Box<dyn ParameterStore>> {
        let store = create_store(
            self.store_kind,
            StoreOptions {
                region: self.region.as_deref(),
                endpoint_url: self.endpoint_url.as_deref(),
                access_key: self.access_key.as_deref(),
                secret_key: self.secret_key.as_deref(),
                store_path: self.store_path.as_deref(),
            },
        )
        .await?;
        tracing::debug!(store = store.name(), prefix = %self.path.prefix(), "Opened parameter store");
        Ok(store)
    }

    /// Name of the stage file as shown to the operator.
    pub fn stage_file_label(&self) -> String {
        format!(".env.{}", self.path.stage())
    }
}
