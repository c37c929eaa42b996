use std::future::Future;
use std::time::Duration;

/// Fixed backoff schedule for a single operation.
///
/// One initial attempt plus one retry per configured delay. Only the error of
/// the final attempt is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

/// Successful result together with the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: usize,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().copied().map(Duration::from_millis).collect())
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Run `op` until it succeeds or the schedule is exhausted.
    ///
    /// `on_retry` is called with the failed attempt number, the delay about to be
    /// slept and the error, before each backoff.
    pub async fn run<T, F, Fut, R>(&self, mut op: F, mut on_retry: R) -> anyhow::Result<Attempted<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
        R: FnMut(usize, Duration, &anyhow::Error),
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        attempts: attempt,
                    });
                }
                Err(e) => match self.delays.get(attempt - 1) {
                    Some(&delay) => {
                        on_retry(attempt, delay, &e);
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&[3000, 6000, 9000])
    }
}
