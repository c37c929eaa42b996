use std::time::Duration;

/// Observable steps of a sync run.
///
/// `RemoteFetched` and `Written` each count as one progress tick; the run total is
/// announced up front with `Started`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    ValueSplit { key: String, parts: usize },
    Started { total: u64 },
    RemoteFetched { count: usize },
    StaleFound { count: usize },
    EmptyLocal,
    Deleted { count: usize },
    Retrying { key: String, attempt: usize, delay: Duration, error: String },
    Written { key: String },
    Finished,
}

impl SyncEvent {
    /// Whether this event advances the progress bar.
    pub fn is_tick(&self) -> bool {
        matches!(self, SyncEvent::RemoteFetched { .. } | SyncEvent::Written { .. })
    }
}

/// Presentation side of a run: receives events and answers the wipe confirmation.
pub trait SyncReporter: Send + Sync {
    fn event(&self, event: SyncEvent);

    /// Ask the operator to approve removing every remote parameter of the stage.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Discards events and declines every confirmation.
pub struct SilentReporter;

impl SyncReporter for SilentReporter {
    fn event(&self, _event: SyncEvent) {}

    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Forwards events to `tracing` and answers confirmations with a fixed value.
pub struct LogReporter {
    pub assume_yes: bool,
}

impl SyncReporter for LogReporter {
    fn event(&self, event: SyncEvent) {
        match event {
            SyncEvent::ValueSplit { key, parts } => {
                tracing::warn!(key = %key, parts, "Value is over the size limit, splitting into multiple keys");
            }
            SyncEvent::StaleFound { count } => {
                tracing::info!(count, "Remote keys not present locally will be deleted");
            }
            SyncEvent::EmptyLocal => tracing::warn!("There are no environment variables set locally"),
            SyncEvent::Retrying {
                key,
                attempt,
                delay,
                error,
            } => {
                tracing::warn!(key = %key, attempt, delay_ms = delay.as_millis() as u64, error = %error, "Write failed, retrying");
            }
            other => tracing::debug!(event = ?other, "sync"),
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        tracing::info!(assume_yes = self.assume_yes, "{prompt}");
        self.assume_yes
    }
}
