/*============================================================
  Synavera Project: Syn-Patch
  Module: synpatch_core::retry
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Run fallible remote operations under a bounded retry
    policy with a fixed interval and cooperative cancellation.

  Security / Safety Notes:
    Failure details are logged verbatim; transports must not
    embed credentials in their error text.

  Dependencies:
    tokio for sleeping, tokio-util for cancellation tokens.

  Operational Scope:
    Every call made by the remote resolution client passes
    through `with_retry`.

  Revision History:
    2026-10-17 COD  Introduced generic retry helper.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Unresolvable hosts fail fast without retry
    - Cancellation aborts the whole sequence, not one attempt
    - Attempt count never exceeds the configured bound
============================================================*/

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SynpatchError};
use crate::logger::Logger;
use crate::service::RemoteFailure;

/// Bounded retry settings, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    interval: Duration,
}

impl RetryPolicy {
    /// A policy of at least one attempt.
    pub fn new(max_attempts: usize, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(500))
    }
}

/// Run `attempt` until it succeeds, fails permanently, is cancelled, or the policy is exhausted.
///
/// The closure receives the 1-based attempt number.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    cancel: &CancellationToken,
    logger: &Logger,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = std::result::Result<T, RemoteFailure>>,
{
    let cancelled = || SynpatchError::Cancelled {
        operation: operation.to_string(),
    };
    let mut last_error = String::new();

    for number in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled()),
            outcome = attempt(number) => outcome,
        };

        match outcome {
            Ok(value) => {
                if number > 1 {
                    logger.info(
                        "RETRY",
                        format!("{operation} succeeded on attempt {number}"),
                    );
                }
                return Ok(value);
            }
            Err(RemoteFailure::HostUnreachable { host, detail }) => {
                logger.error("UNREACHABLE", format!("{operation}: host {host} unreachable"));
                return Err(SynpatchError::RemoteUnreachable { host, detail });
            }
            Err(RemoteFailure::Rejected { status, detail }) => {
                return Err(SynpatchError::Service(format!(
                    "{operation} rejected with status {status}: {detail}"
                )));
            }
            Err(RemoteFailure::Transient(detail)) => {
                logger.warn(
                    "RETRY",
                    format!(
                        "{operation} attempt {number}/{} failed: {detail}",
                        policy.max_attempts
                    ),
                );
                last_error = detail;
            }
        }

        if number < policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = sleep(policy.interval) => {}
            }
        }
    }

    Err(SynpatchError::RetryExhausted {
        operation: operation.to_string(),
        attempts: policy.max_attempts,
        last_error,
    })
}
