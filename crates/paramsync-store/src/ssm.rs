//! AWS Systems Manager Parameter Store backend.

use async_trait::async_trait;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;
use std::collections::BTreeMap;

use paramsync_core::store::ParameterStore;
use paramsync_core::types::ParameterKind;

/// Most names a single DeleteParameters request accepts.
const DELETE_BATCH_SIZE: usize = 10;

/// SSM Parameter Store client scoped to one AWS account and region.
pub struct SsmParameterStore {
    client: Client,
    name: String,
}

/// Options for creating an SSM store.
#[derive(Debug, Default, Clone, Copy)]
pub struct SsmOptions<'a> {
    pub region: Option<&'a str>,
    /// Custom endpoint URL (e.g. `http://localhost:4566` for LocalStack).
    pub endpoint_url: Option<&'a str>,
    /// Explicit access key. If None, uses env/profile credentials.
    pub access_key: Option<&'a str>,
    /// Explicit secret key. If None, uses env/profile credentials.
    pub secret_key: Option<&'a str>,
}

impl SsmParameterStore {
    /// Create with explicit region, endpoint or credentials.
    pub async fn with_options(opts: SsmOptions<'_>) -> anyhow::Result<Self> {
        let mut config_loader = aws_config::from_env();

        if let Some(r) = opts.region {
            config_loader = config_loader.region(aws_config::Region::new(r.to_string()));
        }

        match (opts.access_key, opts.secret_key) {
            (Some(ak), Some(sk)) => {
                let creds =
                    aws_sdk_ssm::config::Credentials::new(ak, sk, None, None, "paramsync-config");
                config_loader = config_loader.credentials_provider(creds);
            }
            (None, None) => {}
            _ => anyhow::bail!("Access key and secret key must be given together"),
        }

        let sdk_config = config_loader.load().await;
        let mut ssm_config_builder = aws_sdk_ssm::config::Builder::from(&sdk_config);

        if let Some(endpoint) = opts.endpoint_url {
            ssm_config_builder = ssm_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(ssm_config_builder.build());
        let name = match sdk_config.region() {
            Some(region) => format!("ssm ({region})"),
            None => "ssm".to_string(),
        };

        Ok(Self { client, name })
    }
}

fn parameter_type(kind: ParameterKind) -> ParameterType {
    match kind {
        ParameterKind::String => ParameterType::String,
        ParameterKind::SecureString => ParameterType::SecureString,
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn list(&self, prefix: &str) -> anyhow::Result<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();

        let mut paginator = self
            .client
            .get_parameters_by_path()
            .path(prefix)
            .recursive(true)
            .with_decryption(true)
            .into_paginator()
            .send();

        while let Some(page) = paginator.next().await {
            let page = page.map_err(|e| {
                anyhow::anyhow!("SSM get_parameters_by_path({prefix}) failed: {}", DisplayErrorContext(&e))
            })?;
            for param in page.parameters() {
                if let (Some(name), Some(value)) = (param.name(), param.value()) {
                    params.insert(name.to_string(), value.to_string());
                }
            }
        }

        tracing::debug!(prefix, count = params.len(), "Listed SSM parameters");
        Ok(params)
    }

    async fn put(&self, name: &str, value: &str, kind: ParameterKind) -> anyhow::Result<()> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .overwrite(true)
            .r#type(parameter_type(kind))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("SSM put_parameter({name}) failed: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn delete_many(&self, names: &[String]) -> anyhow::Result<()> {
        for batch in names.chunks(DELETE_BATCH_SIZE) {
            let resp = self
                .client
                .delete_parameters()
                .set_names(Some(batch.to_vec()))
                .send()
                .await
                .map_err(|e| {
                    anyhow::anyhow!(
                        "SSM delete_parameters({} names) failed: {}",
                        batch.len(),
                        DisplayErrorContext(&e)
                    )
                })?;

            for invalid in resp.invalid_parameters() {
                tracing::warn!(name = %invalid, "SSM reported parameter as invalid (already absent)");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_parameter_kinds() {
        assert_eq!(parameter_type(ParameterKind::String), ParameterType::String);
        assert_eq!(
            parameter_type(ParameterKind::SecureString),
            ParameterType::SecureString
        );
    }

    #[tokio::test]
    async fn half_credentials_rejected() {
        let result = SsmParameterStore::with_options(SsmOptions {
            region: Some("eu-west-1"),
            access_key: Some("AKIA..."),
            ..Default::default()
        })
        .await;
        assert!(result.is_err());
    }
}
