use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff policy for establishing connections
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Randomise each delay to 50-100% of its nominal value
    pub use_jitter: bool,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Delay to wait before retry number `attempt` (1-based), before jitter.
    ///
    /// Saturates at `max_delay` when the exponential term leaves the range
    /// of [`Duration`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// `operation_name` is only used for log output.
///
/// ```ignore
/// let config = RetryConfig::new().with_max_retries(5);
/// let client = retry_with_backoff("mongodb connect", || connect(&settings), config).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation_name: &str,
    mut operation: F,
    config: RetryConfig,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(operation = operation_name, attempt, "Succeeded after retrying");
                }
                return Ok(result);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    warn!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %e,
                        "Giving up"
                    );
                    return Err(e);
                }

                let mut delay = config.delay_for(attempt);
                if config.use_jitter {
                    delay = apply_jitter(delay);
                }

                debug!(
                    operation = operation_name,
                    attempt,
                    max_retries = config.max_retries,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Attempt failed, retrying"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Scale `delay` by a pseudo random factor in [0.5, 1.0).
fn apply_jitter(delay: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    delay.mul_f64(random_factor)
}
