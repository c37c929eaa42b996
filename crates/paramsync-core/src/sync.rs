use std::collections::BTreeMap;

use crate::chunk::reassemble;
use crate::diff::stale_keys;
use crate::error::{Result, SyncError};
use crate::keys::ParameterPath;
use crate::progress::{SyncEvent, SyncReporter};
use crate::retry::RetryPolicy;
use crate::store::ParameterStore;
use crate::types::{DeletionSet, LocalSnapshot, ParameterKind, RemoteSnapshot};

/// Write settings for a run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub kind: ParameterKind,
    pub retry: RetryPolicy,
}

/// What a push would change, computed from one remote fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub stale: DeletionSet,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

impl SyncPlan {
    pub fn build(remote: &RemoteSnapshot, local: &LocalSnapshot) -> Self {
        let mut plan = SyncPlan {
            stale: stale_keys(remote, local),
            ..Default::default()
        };

        for (key, value) in local.iter() {
            match remote.get(key) {
                None => plan.created.push(key.to_string()),
                Some(existing) if existing != value => plan.updated.push(key.to_string()),
                Some(_) => plan.unchanged.push(key.to_string()),
            }
        }

        plan
    }

    /// Number of writes a push performs. Unchanged keys are overwritten too.
    pub fn writes(&self) -> usize {
        self.created.len() + self.updated.len() + self.unchanged.len()
    }
}

/// Outcome of a completed push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub deleted: usize,
    pub written: usize,
    /// Writes that needed more than one attempt.
    pub retried: usize,
}

/// Reconciles one stage of a parameter store with a local snapshot.
pub struct SyncEngine<'a> {
    store: &'a dyn ParameterStore,
    path: ParameterPath,
    options: SyncOptions,
}

impl<'a> SyncEngine<'a> {
    pub fn new(store: &'a dyn ParameterStore, path: ParameterPath, options: SyncOptions) -> Self {
        Self {
            store,
            path,
            options,
        }
    }

    pub fn path(&self) -> &ParameterPath {
        &self.path
    }

    /// Fetch every parameter under the stage prefix.
    pub async fn fetch_remote(&self) -> Result<RemoteSnapshot> {
        let prefix = self.path.prefix();
        let listing = self
            .store
            .list(&prefix)
            .await
            .map_err(|source| SyncError::RemoteFetch {
                prefix: prefix.clone(),
                source,
            })?;
        Ok(RemoteSnapshot::from_listing(&self.path, listing))
    }

    /// Compute the changes a push would make without touching the store.
    pub async fn plan(&self, local: &LocalSnapshot) -> Result<SyncPlan> {
        let remote = self.fetch_remote().await?;
        Ok(SyncPlan::build(&remote, local))
    }

    /// Make the remote stage mirror `local`: delete stale keys, then write every local key.
    ///
    /// Stops at the first unrecovered failure. Nothing already deleted or written is
    /// rolled back.
    pub async fn push(&self, local: &LocalSnapshot, reporter: &dyn SyncReporter) -> Result<SyncReport> {
        reporter.event(SyncEvent::Started {
            total: local.len() as u64 + 1,
        });

        let remote = self.fetch_remote().await?;
        reporter.event(SyncEvent::RemoteFetched {
            count: remote.len(),
        });

        let stale = stale_keys(&remote, local);
        let mut report = SyncReport::default();

        if !stale.is_empty() {
            report.deleted = self.delete_stale(&stale, local, reporter).await?;
        }

        for (key, value) in local.iter() {
            let attempts = self.write(key, value, reporter).await?;
            if attempts > 1 {
                report.retried += 1;
            }
            report.written += 1;
            reporter.event(SyncEvent::Written {
                key: key.to_string(),
            });
        }

        reporter.event(SyncEvent::Finished);
        tracing::info!(
            stage = %self.path.stage(),
            deleted = report.deleted,
            written = report.written,
            retried = report.retried,
            "Push completed"
        );

        Ok(report)
    }

    /// Fetch the stage and join chunked values back together.
    pub async fn pull(&self) -> Result<BTreeMap<String, String>> {
        let remote = self.fetch_remote().await?;
        Ok(reassemble(remote.into_inner()))
    }

    async fn delete_stale(
        &self,
        stale: &DeletionSet,
        local: &LocalSnapshot,
        reporter: &dyn SyncReporter,
    ) -> Result<usize> {
        reporter.event(SyncEvent::StaleFound { count: stale.len() });

        if local.is_empty() {
            reporter.event(SyncEvent::EmptyLocal);
            let prompt = format!(
                "This will remove all {} variables under {}, are you sure you want to proceed?",
                stale.len(),
                self.path.prefix()
            );
            if !reporter.confirm(&prompt) {
                return Err(SyncError::Aborted);
            }
        }

        let names: Vec<String> = stale.iter().map(|key| self.path.qualify(key)).collect();
        tracing::debug!(count = names.len(), "Deleting stale parameters");

        self.store
            .delete_many(&names)
            .await
            .map_err(|source| SyncError::Delete {
                count: names.len(),
                source,
            })?;

        reporter.event(SyncEvent::Deleted { count: names.len() });
        Ok(names.len())
    }

    async fn write(&self, key: &str, value: &str, reporter: &dyn SyncReporter) -> Result<usize> {
        let name = self.path.qualify(key);
        let name = name.as_str();
        let store = self.store;
        let kind = self.options.kind;

        let attempted = self
            .options
            .retry
            .run(
                move || store.put(name, value, kind),
                |attempt, delay, err| {
                    reporter.event(SyncEvent::Retrying {
                        key: key.to_string(),
                        attempt,
                        delay,
                        error: err.to_string(),
                    });
                },
            )
            .await
            .map_err(|source| SyncError::Write {
                key: key.to_string(),
                attempts: self.options.retry.max_attempts(),
                source,
            })?;

        Ok(attempted.attempts)
    }
}
