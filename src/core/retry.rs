// maestro/src/core/retry.rs

//! Per-step retry configuration: attempt limit, backoff delay, and an
//! optional filter restricting which failures are worth retrying.

use std::sync::Arc;
use std::time::Duration;

type RetryMatcher = Arc<dyn Fn(&anyhow::Error) -> bool + Send + Sync>;

/// How many attempts a step gets and how long to wait between them.
///
/// Attempts are counted starting at 1; `max_attempts` must be at least 1
/// (a policy of one attempt means "no retry"). With no matchers registered,
/// every failure is retryable; once at least one matcher exists, a failure
/// that matches none of them short-circuits the remaining attempts.
#[derive(Clone)]
pub struct RetryPolicy {
  max_attempts: u32,
  backoff: Duration,
  retry_on: Vec<RetryMatcher>,
}

impl RetryPolicy {
  /// A single attempt, no backoff: the default for every step.
  pub fn none() -> Self {
    Self {
      max_attempts: 1,
      backoff: Duration::ZERO,
      retry_on: Vec::new(),
    }
  }

  /// Up to `max_attempts` attempts with a fixed delay between failed ones.
  ///
  /// Panics if `max_attempts` is zero; that is a configuration error caught
  /// before any execution begins.
  pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
    assert!(max_attempts >= 1, "RetryPolicy requires max_attempts >= 1");
    Self {
      max_attempts,
      backoff,
      retry_on: Vec::new(),
    }
  }

  /// Restricts retries to failures downcastable to the error type `E`.
  ///
  /// May be called multiple times to widen the retryable set.
  pub fn retry_on<E>(mut self) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    self
      .retry_on
      .push(Arc::new(|err| err.downcast_ref::<E>().is_some()));
    self
  }

  /// Restricts retries to failures accepted by an arbitrary predicate.
  pub fn retry_if(mut self, pred: impl Fn(&anyhow::Error) -> bool + Send + Sync + 'static) -> Self {
    self.retry_on.push(Arc::new(pred));
    self
  }

  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }

  pub fn backoff(&self) -> Duration {
    self.backoff
  }

  pub(crate) fn is_retryable(&self, err: &anyhow::Error) -> bool {
    self.retry_on.is_empty() || self.retry_on.iter().any(|matcher| matcher(err))
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::none()
  }
}

impl std::fmt::Debug for RetryPolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RetryPolicy")
      .field("max_attempts", &self.max_attempts)
      .field("backoff", &self.backoff)
      .field("matchers", &self.retry_on.len())
      .finish()
  }
}
