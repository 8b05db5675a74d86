// maestro/src/core/step.rs

//! Step definitions: the erased async body, per-step options (retry policy +
//! failure handler), and the constructors used by the orchestrator builders.

use crate::core::context::{Context, Key};
use crate::core::control::FailureStrategy;
use crate::core::retry::RetryPolicy;
use crate::error::StepError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type-erased step body.
///
/// A body takes a clone of the shared [`Context`] and resolves to
/// `Ok(())` or the failure that attempt raised. For value-producing steps
/// the write of the output under its typed key is baked into this closure at
/// registration time, so output typing is checked by construction and never
/// at call time. Bodies must be re-invokable: the retry loop may call them
/// more than once.
pub(crate) type StepBody =
  Box<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>> + Send + Sync>;

/// Per-step failure decision: a pure function of (failure, context).
pub type FailureHandler = Arc<dyn Fn(&StepError, &Context) -> FailureStrategy + Send + Sync>;

/// Value object pairing a [`RetryPolicy`] with a failure handler.
///
/// Defaults: one attempt, [`FailureStrategy::Stop`] on any failure.
#[derive(Clone)]
pub struct StepOptions {
  pub(crate) retry: RetryPolicy,
  pub(crate) on_failure: FailureHandler,
}

impl StepOptions {
  pub fn defaults() -> Self {
    Self {
      retry: RetryPolicy::none(),
      on_failure: Arc::new(|_, _| FailureStrategy::Stop),
    }
  }

  /// Shortcut for "up to `attempts` attempts, no backoff, stop on failure".
  pub fn retry(attempts: u32) -> Self {
    Self::builder()
      .retry_policy(RetryPolicy::fixed(attempts, std::time::Duration::ZERO))
      .build()
  }

  pub fn builder() -> StepOptionsBuilder {
    StepOptionsBuilder {
      retry: RetryPolicy::none(),
      on_failure: Arc::new(|_, _| FailureStrategy::Stop),
    }
  }

  pub fn retry_policy(&self) -> &RetryPolicy {
    &self.retry
  }
}

impl Default for StepOptions {
  fn default() -> Self {
    Self::defaults()
  }
}

impl std::fmt::Debug for StepOptions {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepOptions").field("retry", &self.retry).finish()
  }
}

pub struct StepOptionsBuilder {
  retry: RetryPolicy,
  on_failure: FailureHandler,
}

impl StepOptionsBuilder {
  pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
    self.retry = policy;
    self
  }

  /// Resolves every terminal failure of this step to a fixed strategy.
  pub fn failure_strategy(mut self, strategy: FailureStrategy) -> Self {
    self.on_failure = Arc::new(move |_, _| strategy);
    self
  }

  /// Decides stop/continue per failure, with access to the shared context.
  pub fn on_failure(
    mut self,
    handler: impl Fn(&StepError, &Context) -> FailureStrategy + Send + Sync + 'static,
  ) -> Self {
    self.on_failure = Arc::new(handler);
    self
  }

  pub fn build(self) -> StepOptions {
    StepOptions {
      retry: self.retry,
      on_failure: self.on_failure,
    }
  }
}

/// One named unit of work, immutable after construction.
///
/// Step names identify steps in metadata and listener hooks; uniqueness
/// within a pipeline is conventional, not enforced.
pub struct StepDef {
  pub(crate) name: String,
  pub(crate) body: StepBody,
  pub(crate) options: StepOptions,
}

impl StepDef {
  /// A value-producing step: on success the returned value is stored in the
  /// context under `key`. The step is named after the key.
  pub(crate) fn producing<T, F, E>(
    key: Key<T>,
    body: impl Fn(Context) -> F + Send + Sync + 'static,
    options: StepOptions,
  ) -> Self
  where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    let name = key.name().to_string();
    let erased: StepBody = Box::new(move |ctx: Context| {
      let key = key.clone();
      let fut = body(ctx.clone());
      Box::pin(async move {
        let value = fut.await.map_err(Into::into)?;
        ctx.put(&key, value);
        Ok(())
      })
    });
    Self {
      name,
      body: erased,
      options,
    }
  }

  /// An effect-only step: nothing is stored on success.
  pub(crate) fn effect<F, E>(
    name: impl Into<String>,
    body: impl Fn(Context) -> F + Send + Sync + 'static,
    options: StepOptions,
  ) -> Self
  where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    let erased: StepBody = Box::new(move |ctx: Context| {
      let fut = body(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    Self {
      name: name.into(),
      body: erased,
      options,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl std::fmt::Debug for StepDef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("options", &self.options)
      .finish()
  }
}
