use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, BufRead, Write};

use paramsync_core::progress::{SyncEvent, SyncReporter};

/// Terminal presentation of a push: progress bar plus operator notices.
pub struct ProgressReporter {
    bar: ProgressBar,
    source: String,
    assume_yes: bool,
}

impl ProgressReporter {
    pub fn new(source: &str, assume_yes: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            source: source.to_string(),
            assume_yes,
        }
    }

    fn notice(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("{msg}"));
    }

    fn warn(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("WARN: {msg}"));
    }
}

impl SyncReporter for ProgressReporter {
    fn event(&self, event: SyncEvent) {
        match event {
            SyncEvent::ValueSplit { key, parts } => {
                self.warn(&format!(
                    "Value for {key} is over the size limit, splitting into {parts} keys."
                ));
            }
            SyncEvent::Started { total } => {
                self.bar.set_length(total);
                if let Ok(style) =
                    ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                {
                    self.bar.set_style(style.progress_chars("=>-"));
                }
                self.bar.set_draw_target(ProgressDrawTarget::stderr());
            }
            SyncEvent::RemoteFetched { count } => {
                self.bar.set_message(format!("{count} remote parameters"));
                self.bar.inc(1);
            }
            SyncEvent::StaleFound { count } => {
                self.notice(&format!(
                    "{count} variables found not present in {}. Deleting removed keys.",
                    self.source
                ));
            }
            SyncEvent::EmptyLocal => self.warn("There are no environment variables set locally."),
            SyncEvent::Deleted { count } => {
                tracing::debug!(count, "Deleted stale parameters");
            }
            SyncEvent::Retrying {
                key,
                attempt,
                delay,
                error,
            } => {
                self.bar.suspend(|| {
                    tracing::warn!(
                        key = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Write failed, retrying"
                    );
                });
            }
            SyncEvent::Written { key } => {
                self.bar.set_message(key);
                self.bar.inc(1);
            }
            SyncEvent::Finished => self.bar.finish_with_message("done"),
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            tracing::info!("Confirmation pre-approved with --yes");
            return true;
        }
        self.bar
            .suspend(|| ask(prompt, io::stdin().lock(), io::stderr()))
            .unwrap_or(false)
    }
}

/// Yes/no prompt; anything but `y`/`yes` is a no.
fn ask(prompt: &str, mut input: impl BufRead, mut output: impl Write) -> io::Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
