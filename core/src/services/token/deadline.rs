//! Caller-supplied bound on the I/O an operation may perform

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::BackendError;

/// Deadline propagated from the request into every store round-trip
///
/// Each backend call runs for at most `min(configured timeout, remaining)`.
/// `Deadline::none()` leaves only the configured per-backend timeouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    pub fn after(duration: Duration) -> Self {
        Self::at(Instant::now() + duration)
    }

    /// Time left, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }

    /// Budget for one backend call capped at `limit`
    pub(crate) fn budget(&self, limit: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(limit),
            None => limit,
        }
    }
}

/// Run one backend call within `limit` and the deadline
///
/// An already expired deadline fails without starting the call.
pub(crate) async fn run_within<T, F>(
    backend: &'static str,
    deadline: Deadline,
    limit: Duration,
    call: F,
) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    if deadline.is_expired() {
        return Err(BackendError::Timeout {
            backend,
            after_ms: 0,
        });
    }

    let budget = deadline.budget(limit);
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            backend,
            after_ms: budget.as_millis() as u64,
        }),
    }
}
