// Bounded retry for state machine creation racing a pending deletion

use backon::{ConstantBuilder, Retryable};
use regex::Regex;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::external::AwsError;

static BEING_DELETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"State Machine is being deleted").expect("pattern is valid"));

/// `true` when creation failed only because the previous machine with the
/// same name has not finished deleting yet.
pub fn is_state_machine_deleting(error: &AwsError) -> bool {
    BEING_DELETED.is_match(&error.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// A value produced after `attempts` tries
#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

#[derive(Debug)]
pub enum RetryFailure {
    /// The error was not retryable; no further attempt was made
    NonRetryable { attempts: u32, error: AwsError },
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, error: AwsError },
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Run `operation` until it succeeds, fails with an error `should_retry`
    /// rejects, or the attempt budget is spent. Delays are awaited.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        mut operation: F,
        should_retry: impl Fn(&AwsError) -> bool,
    ) -> Result<Attempted<T>, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AwsError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let attempts = AtomicU32::new(0);
        let backoff = ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times((max_attempts - 1) as usize);

        let outcome = (|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            operation()
        })
        .retry(backoff)
        .when(|error| should_retry(error))
        .notify(|error, delay| {
            warn!(
                delay_ms = delay.as_millis() as u64,
                %error,
                "Operation failed (retryable), waiting before next attempt"
            );
        })
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        match outcome {
            Ok(value) => {
                debug!(attempts, "Operation succeeded");
                Ok(Attempted { value, attempts })
            }
            Err(error) if should_retry(&error) => {
                warn!(attempts, %error, "Retry budget exhausted");
                Err(RetryFailure::Exhausted { attempts, error })
            }
            Err(error) => Err(RetryFailure::NonRetryable { attempts, error }),
        }
    }
}
