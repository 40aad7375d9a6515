use std::{fmt::Display, future::Future, time::Duration};

use tracing::{debug, warn};

/// Bounded retry with multiplicative backoff and a per-attempt deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub initial_delay: Duration,
    /// Factor applied to the wait after every further failure.
    pub backoff_multiplier: f64,
    /// An attempt still running after this long is abandoned and counted
    /// as failed.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1_000),
            backoff_multiplier: 1.5,
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Waits inserted between consecutive attempts, in order.
    ///
    /// There is one fewer wait than attempts: nothing is awaited after the
    /// last failure.
    /// A wait that would overflow saturates at [`Duration::MAX`].
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let waits = self.max_attempts.max(1) as usize - 1;
        std::iter::successors(Some(self.initial_delay), |delay| {
            Some(scale_delay(*delay, self.backoff_multiplier))
        })
        .take(waits)
    }

    /// Run `attempt` until it succeeds or the policy is exhausted.
    ///
    /// `attempt` receives the 1-based attempt number. Attempts that outlive
    /// `attempt_timeout` are dropped, which cancels whatever they were
    /// awaiting, and `on_timeout` builds their error. Only the last failure
    /// is returned; earlier ones are logged and discarded.
    pub async fn execute<T, E, F, Fut>(
        &self,
        label: &str,
        mut attempt: F,
        on_timeout: impl Fn(Duration) -> E,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut delays = self.delays();
        let mut number = 1;

        loop {
            let outcome =
                match tokio::time::timeout(self.attempt_timeout, attempt(number))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(on_timeout(self.attempt_timeout)),
                };

            match outcome {
                Ok(value) => {
                    if number > 1 {
                        debug!(
                            "[retry] {} succeeded on attempt {}/{}",
                            label, number, max_attempts
                        );
                    }
                    return Ok(value);
                }
                Err(err) if number < max_attempts => {
                    let delay = delays.next().unwrap_or(self.initial_delay);
                    warn!(
                        "[retry] {} attempt {}/{} failed, retrying in {:?}: {}",
                        label, number, max_attempts, delay, err
                    );
                    tokio::time::sleep(delay).await;
                    number += 1;
                }
                Err(err) => {
                    warn!(
                        "[retry] {} giving up after {} attempts: {}",
                        label, max_attempts, err
                    );
                    return Err(err);
                }
            }
        }
    }
}

fn scale_delay(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
        .unwrap_or(Duration::MAX)
}
