// maestro/src/pipeline/definition.rs

//! The `Orchestrator` struct and the fluent builders that assemble its
//! ordered sequence of step groups and listener list.

use crate::core::context::{Context, Key};
use crate::core::step::{StepDef, StepOptions};
use crate::listener::{default_fault_reporter, FaultReporter, Listener, ListenerFault};
use std::future::Future;
use std::sync::Arc;

/// An immutable, reusable pipeline definition: an ordered sequence of step
/// groups plus the listeners observing every run.
///
/// A group of one step runs inline and strictly in sequence with its
/// neighbours; a group of several steps runs its members concurrently and
/// joins before the next group starts. Built once via
/// [`Orchestrator::builder`], then executed any number of times.
pub struct Orchestrator {
  pub(crate) groups: Vec<Vec<Arc<StepDef>>>,
  pub(crate) listeners: Vec<Arc<dyn Listener>>,
  pub(crate) fault_reporter: FaultReporter,
}

impl Orchestrator {
  pub fn builder() -> OrchestratorBuilder {
    OrchestratorBuilder {
      groups: Vec::new(),
      listeners: Vec::new(),
      fault_reporter: default_fault_reporter(),
    }
  }
}

impl std::fmt::Debug for Orchestrator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Orchestrator")
      .field("groups", &self.groups)
      .field("num_listeners", &self.listeners.len())
      .finish()
  }
}

/// Assembles an [`Orchestrator`] step by step. Each `step`/`task` call
/// appends a sequential group of one; [`OrchestratorBuilder::parallel`]
/// appends a concurrent group.
pub struct OrchestratorBuilder {
  groups: Vec<Vec<Arc<StepDef>>>,
  listeners: Vec<Arc<dyn Listener>>,
  fault_reporter: FaultReporter,
}

impl OrchestratorBuilder {
  /// Appends a value-producing step with default options. On success the
  /// body's output is stored in the context under `key`; the step is named
  /// after the key.
  pub fn step<T, F, E>(self, key: Key<T>, body: impl Fn(Context) -> F + Send + Sync + 'static) -> Self
  where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.step_with(key, body, StepOptions::defaults())
  }

  /// Appends a value-producing step with explicit options.
  pub fn step_with<T, F, E>(
    mut self,
    key: Key<T>,
    body: impl Fn(Context) -> F + Send + Sync + 'static,
    options: StepOptions,
  ) -> Self
  where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.groups.push(vec![Arc::new(StepDef::producing(key, body, options))]);
    self
  }

  /// Appends an effect-only step with default options: the body runs for its
  /// side effects on the context and stores nothing itself.
  pub fn task<F, E>(self, name: impl Into<String>, body: impl Fn(Context) -> F + Send + Sync + 'static) -> Self
  where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.task_with(name, body, StepOptions::defaults())
  }

  /// Appends an effect-only step with explicit options.
  pub fn task_with<F, E>(
    mut self,
    name: impl Into<String>,
    body: impl Fn(Context) -> F + Send + Sync + 'static,
    options: StepOptions,
  ) -> Self
  where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.groups.push(vec![Arc::new(StepDef::effect(name, body, options))]);
    self
  }

  /// Appends a group whose members run concurrently, joined before the next
  /// group starts. Panics if the closure declares no steps; an empty
  /// parallel group is a configuration error caught before execution.
  pub fn parallel(mut self, configure: impl FnOnce(&mut ParallelGroupBuilder)) -> Self {
    let mut group = ParallelGroupBuilder { steps: Vec::new() };
    configure(&mut group);
    assert!(
      !group.steps.is_empty(),
      "maestro setup error: parallel step group cannot be empty"
    );
    self.groups.push(group.steps);
    self
  }

  /// Registers a listener. Hooks fire in registration order for every step.
  pub fn listener(mut self, listener: impl Listener + 'static) -> Self {
    self.listeners.push(Arc::new(listener));
    self
  }

  /// Replaces the default (tracing-based) sink for listener faults.
  pub fn fault_reporter(mut self, reporter: impl Fn(&ListenerFault) + Send + Sync + 'static) -> Self {
    self.fault_reporter = Arc::new(reporter);
    self
  }

  pub fn build(self) -> Orchestrator {
    Orchestrator {
      groups: self.groups,
      listeners: self.listeners,
      fault_reporter: self.fault_reporter,
    }
  }
}

/// Mirror of the step-declaring half of [`OrchestratorBuilder`], scoped to
/// one concurrent group.
pub struct ParallelGroupBuilder {
  steps: Vec<Arc<StepDef>>,
}

impl ParallelGroupBuilder {
  pub fn step<T, F, E>(&mut self, key: Key<T>, body: impl Fn(Context) -> F + Send + Sync + 'static) -> &mut Self
  where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.step_with(key, body, StepOptions::defaults())
  }

  pub fn step_with<T, F, E>(
    &mut self,
    key: Key<T>,
    body: impl Fn(Context) -> F + Send + Sync + 'static,
    options: StepOptions,
  ) -> &mut Self
  where
    T: Send + Sync + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.steps.push(Arc::new(StepDef::producing(key, body, options)));
    self
  }

  pub fn task<F, E>(&mut self, name: impl Into<String>, body: impl Fn(Context) -> F + Send + Sync + 'static) -> &mut Self
  where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.task_with(name, body, StepOptions::defaults())
  }

  pub fn task_with<F, E>(
    &mut self,
    name: impl Into<String>,
    body: impl Fn(Context) -> F + Send + Sync + 'static,
    options: StepOptions,
  ) -> &mut Self
  where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error>,
  {
    self.steps.push(Arc::new(StepDef::effect(name, body, options)));
    self
  }
}
