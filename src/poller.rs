//! Bounded, cancellable readiness polling.
//!
//! SoftLayer completes guest boots and image captures out-of-band. The poller
//! bridges that gap: a spawned task repeatedly queries the resource until a
//! predicate holds, while the caller races it against a deadline. Whichever
//! finishes first decides the outcome, and the polling task is aborted as soon
//! as the wait returns or is dropped.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

/// Delay between two status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Errors raised by [`ReadinessPoller::wait`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum WaitError<E> {
    /// The deadline elapsed before the resource became ready.
    #[error("timed out after {waited:?} waiting for {resource_id} to become ready")]
    Timeout {
        /// Resource that was being polled.
        resource_id: String,
        /// Deadline that elapsed.
        waited: Duration,
    },
    /// A status query failed.
    #[error("status query for {resource_id} failed: {error}")]
    Query {
        /// Resource that was being polled.
        resource_id: String,
        /// Underlying query error.
        error: E,
    },
    /// The polling task ended without producing a result.
    #[error("polling {resource_id} was interrupted: {message}")]
    Interrupted {
        /// Resource that was being polled.
        resource_id: String,
        /// Description of the interruption.
        message: String,
    },
}

/// Polls a status query at a fixed interval until it reports readiness.
#[derive(Clone, Copy, Debug)]
pub struct ReadinessPoller {
    interval: Duration,
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessPoller {
    /// Creates a poller using [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the polling interval. Intended for tests.
    #[must_use]
    pub const fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    /// Returns the configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until `predicate` accepts a status returned by `query`.
    ///
    /// The first query is issued immediately; subsequent queries follow after
    /// each interval. The returned status is the one that satisfied the
    /// predicate.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] when `timeout` elapses first,
    /// [`WaitError::Query`] when a query fails, and
    /// [`WaitError::Interrupted`] when the polling task panics or is
    /// cancelled.
    pub async fn wait<S, E, Q, Fut, P>(
        &self,
        resource_id: &str,
        timeout: Duration,
        query: Q,
        predicate: P,
    ) -> Result<S, WaitError<E>>
    where
        S: Send + 'static,
        E: Send + 'static,
        Q: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<S, E>> + Send + 'static,
        P: Fn(&S) -> bool + Send + 'static,
    {
        let mut task = AbortOnDrop(tokio::spawn(poll_until_ready(
            resource_id.to_owned(),
            self.interval,
            query,
            predicate,
        )));

        tokio::select! {
            joined = &mut task.0 => match joined {
                Ok(Ok(status)) => Ok(status),
                Ok(Err(error)) => Err(WaitError::Query {
                    resource_id: resource_id.to_owned(),
                    error,
                }),
                Err(err) => Err(WaitError::Interrupted {
                    resource_id: resource_id.to_owned(),
                    message: err.to_string(),
                }),
            },
            () = tokio::time::sleep(timeout) => {
                debug!(resource_id, ?timeout, "readiness deadline elapsed");
                Err(WaitError::Timeout {
                    resource_id: resource_id.to_owned(),
                    waited: timeout,
                })
            }
        }
    }
}

async fn poll_until_ready<S, E, Q, Fut, P>(
    resource_id: String,
    interval: Duration,
    mut query: Q,
    predicate: P,
) -> Result<S, E>
where
    Q: FnMut() -> Fut,
    Fut: Future<Output = Result<S, E>>,
    P: Fn(&S) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        let status = query().await?;
        if predicate(&status) {
            debug!(%resource_id, attempt, "resource ready");
            return Ok(status);
        }
        debug!(%resource_id, attempt, "resource not ready yet");
        tokio::time::sleep(interval).await;
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
