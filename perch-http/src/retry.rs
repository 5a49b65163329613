//! Bounded, linear-delay retry around a [`Transport`].
//!
//! Each attempt is classified as success, retryable failure or fatal failure:
//!
//! ```text
//! Idle -> Sending -> Success
//!                 -> RetryableFailure -> (sleep retry_delay) -> Sending
//!                 -> FatalFailure
//! ```
//!
//! A failure is retryable when the transport reports a network error, or the
//! status is listed in [`RetryPolicy::retry_errors`], and the retry budget is not
//! spent. `retry_count = 0` means one attempt and no retry.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::{
    BoundRequest, HttpError, RawResponse, Transport, TransportError, extract_error_message,
    snip_body,
};

/// How many times to retry, how long to wait, and which statuses qualify.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retry_count: usize,
    pub retry_delay: Duration,
    pub retry_errors: BTreeSet<u16>,
}

impl RetryPolicy {
    pub fn new(
        retry_count: usize,
        retry_delay: Duration,
        retry_errors: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            retry_count,
            retry_delay,
            retry_errors: retry_errors.into_iter().collect(),
        }
    }

    pub fn with_retry_count(mut self, n: usize) -> Self {
        self.retry_count = n;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_retry_errors(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_errors = statuses.into_iter().collect();
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.retry_count + 1
    }

    fn retries_status(&self, status: u16) -> bool {
        self.retry_errors.contains(&status)
    }
}

enum Attempt {
    Success(RawResponse),
    Retryable(Failure),
    Fatal(HttpError),
}

enum Failure {
    Network(String),
    Status(RawResponse),
}

/// Runs requests through a transport under a [`RetryPolicy`].
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn classify(&self, outcome: Result<RawResponse, TransportError>) -> Attempt {
        match outcome {
            Ok(resp) if resp.is_success() => Attempt::Success(resp),
            Ok(resp) if self.policy.retries_status(resp.status) => {
                Attempt::Retryable(Failure::Status(resp))
            }
            Ok(resp) => Attempt::Fatal(status_error(resp)),
            Err(TransportError::Network(message)) => Attempt::Retryable(Failure::Network(message)),
            Err(TransportError::Build(message)) => Attempt::Fatal(HttpError::Build(message)),
        }
    }

    /// Send `request`, retrying per policy. Returns the first 2xx response.
    pub async fn execute(&self, request: &BoundRequest) -> Result<RawResponse, HttpError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let outcome = self.transport.send(request).await;

            let failure = match self.classify(outcome) {
                Attempt::Success(resp) => {
                    tracing::debug!(
                        method = %request.method,
                        path = %request.url.path(),
                        status = resp.status,
                        attempt,
                        "http.success"
                    );
                    return Ok(resp);
                }
                Attempt::Fatal(err) => {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.url.path(),
                        attempt,
                        error = %err,
                        "http.error"
                    );
                    return Err(err);
                }
                Attempt::Retryable(failure) => failure,
            };

            if attempt >= max_attempts {
                let err = match failure {
                    Failure::Network(message) => HttpError::Network {
                        message,
                        attempts: attempt,
                    },
                    Failure::Status(resp) => status_error(resp),
                };
                tracing::warn!(
                    method = %request.method,
                    path = %request.url.path(),
                    attempt,
                    max_attempts,
                    error = %err,
                    "http.retry_budget_exhausted"
                );
                return Err(err);
            }

            match &failure {
                Failure::Network(message) => tracing::warn!(
                    path = %request.url.path(),
                    attempt,
                    max_attempts,
                    backoff_ms = self.policy.retry_delay.as_millis() as u64,
                    message = %message,
                    "http.retrying.network"
                ),
                Failure::Status(resp) => tracing::warn!(
                    path = %request.url.path(),
                    status = resp.status,
                    attempt,
                    max_attempts,
                    backoff_ms = self.policy.retry_delay.as_millis() as u64,
                    body_snippet = %snip_body(&resp.body),
                    "http.retrying.status"
                ),
            }
            if !self.policy.retry_delay.is_zero() {
                sleep(self.policy.retry_delay).await;
            }
        }
    }
}

fn status_error(resp: RawResponse) -> HttpError {
    HttpError::Status {
        status: resp.status,
        message: extract_error_message(&resp.body),
        body: resp.body_text(),
    }
}
