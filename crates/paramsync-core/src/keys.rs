//! Qualified parameter names: `/{app_name}/{stage}/{key}`.

use crate::error::{Result, SyncError};

/// Namespace for one application stage in the parameter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPath {
    app_name: String,
    stage: String,
}

impl ParameterPath {
    pub fn new(app_name: &str, stage: &str) -> Result<Self> {
        let app_name = app_name.trim().trim_matches('/');
        let stage = normalize_stage(stage);

        if app_name.is_empty() {
            return Err(SyncError::Config("Application name must not be empty".to_string()));
        }
        if stage.is_empty() {
            return Err(SyncError::Config("Stage must not be empty".to_string()));
        }
        if stage.contains('/') {
            return Err(SyncError::Config(format!(
                "Stage '{stage}' must not contain '/'"
            )));
        }

        Ok(Self {
            app_name: app_name.to_string(),
            stage: stage.to_string(),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Listing prefix for the stage, without a trailing slash.
    pub fn prefix(&self) -> String {
        format!("/{}/{}", self.app_name, self.stage)
    }

    pub fn qualify(&self, key: &str) -> String {
        format!("/{}/{}/{}", self.app_name, self.stage, key)
    }

    /// Inverse of [`qualify`](Self::qualify). `None` if `name` is outside this stage.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        let rest = name.strip_prefix('/')?;
        let rest = rest.strip_prefix(self.app_name.as_str())?;
        let rest = rest.strip_prefix('/')?;
        let rest = rest.strip_prefix(self.stage.as_str())?;
        let key = rest.strip_prefix('/')?;
        if key.is_empty() { None } else { Some(key) }
    }
}

/// Accepts both `production` and `stage=production`.
pub fn normalize_stage(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix("stage=").unwrap_or(raw)
}
