use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chunk::DEFAULT_CHUNK_LIMIT;
use crate::error::{Result, SyncError};
use crate::retry::RetryPolicy;
use crate::sync::SyncOptions;
use crate::types::{ParameterKind, StoreKind};

/// Project configuration stored as TOML (`paramsync.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamsyncConfig {
    #[serde(default)]
    pub paramsync: ParamsyncSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsyncSettings {
    /// Application name used as the first path segment.
    #[serde(default)]
    pub app_name: Option<String>,
    /// AWS region for the SSM store.
    #[serde(default)]
    pub region: Option<String>,
    /// Directory containing the `.env.{stage}` files.
    #[serde(default = "default_env_dir")]
    pub env_dir: String,
    /// Values at or above this many characters are split into parts.
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,
    /// Delays between write attempts, in milliseconds.
    #[serde(default = "default_retry_delays_ms")]
    pub retry_delays_ms: Vec<u64>,
    #[serde(default)]
    pub parameter_type: ParameterKind,
    #[serde(default)]
    pub store: StoreKind,
    /// JSON file backing the local store.
    #[serde(default)]
    pub store_path: Option<String>,
    /// Custom SSM endpoint (e.g. LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for ParamsyncSettings {
    fn default() -> Self {
        Self {
            app_name: None,
            region: None,
            env_dir: default_env_dir(),
            chunk_limit: default_chunk_limit(),
            retry_delays_ms: default_retry_delays_ms(),
            parameter_type: ParameterKind::default(),
            store: StoreKind::default(),
            store_path: None,
            endpoint_url: None,
        }
    }
}

fn default_env_dir() -> String {
    ".".to_string()
}

fn default_chunk_limit() -> usize {
    DEFAULT_CHUNK_LIMIT
}

fn default_retry_delays_ms() -> Vec<u64> {
    vec![3000, 6000, 9000]
}

impl ParamsyncConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SyncError::Config(format!(
                "Configuration file not found at {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| SyncError::TomlDe(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config if the file exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SyncError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `paramsync.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("paramsync.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.paramsync.chunk_limit == 0 {
            return Err(SyncError::Config("chunk_limit must be greater than zero".to_string()));
        }
        if self.paramsync.store == StoreKind::Local && self.paramsync.store_path.is_none() {
            return Err(SyncError::Config(
                "store = \"local\" requires store_path".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(&self.paramsync.retry_delays_ms)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            kind: self.paramsync.parameter_type,
            retry: self.retry_policy(),
        }
    }
}
