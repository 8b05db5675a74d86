// maestro/src/pipeline/result.rs

//! Execution records: per-step metadata and the final orchestration result.

use crate::core::context::Context;
use crate::core::control::Status;
use crate::error::StepError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Immutable record of one step execution, created exactly once per executed
/// step and handed to listeners as well as collected into the final result.
#[derive(Debug, Clone)]
pub struct StepMetadata {
  step_name: String,
  started_at: Instant,
  ended_at: Instant,
  success: bool,
  failure: Option<Arc<StepError>>,
  attempts: u32,
}

impl StepMetadata {
  pub(crate) fn succeeded(step_name: String, started_at: Instant, ended_at: Instant, attempts: u32) -> Self {
    Self {
      step_name,
      started_at,
      ended_at,
      success: true,
      failure: None,
      attempts,
    }
  }

  pub(crate) fn failed(
    step_name: String,
    started_at: Instant,
    ended_at: Instant,
    attempts: u32,
    failure: Arc<StepError>,
  ) -> Self {
    Self {
      step_name,
      started_at,
      ended_at,
      success: false,
      failure: Some(failure),
      attempts,
    }
  }

  pub fn step_name(&self) -> &str {
    &self.step_name
  }

  pub fn started_at(&self) -> Instant {
    self.started_at
  }

  pub fn ended_at(&self) -> Instant {
    self.ended_at
  }

  /// Wall-clock time spent on the step, retries and backoff included.
  pub fn processing_time(&self) -> Duration {
    self.ended_at.duration_since(self.started_at)
  }

  pub fn is_success(&self) -> bool {
    self.success
  }

  /// The terminal failure, absent on success.
  pub fn failure(&self) -> Option<&StepError> {
    self.failure.as_deref()
  }

  /// Attempts made, counted from 1. Zero only for a member of a parallel
  /// group whose worker task faulted before reporting back.
  pub fn attempts(&self) -> u32 {
    self.attempts
  }
}

/// Final, immutable record of a run: overall status, the shared context, and
/// the per-step metadata in group declaration order.
///
/// Steps of groups that never started (because an earlier group stopped the
/// run) do not appear at all, which distinguishes "not run" from "ran and
/// failed".
#[derive(Debug)]
pub struct OrchestrationResult {
  status: Status,
  context: Context,
  steps: Vec<StepMetadata>,
}

impl OrchestrationResult {
  /// Folds the collected metadata and scheduler flags into a final status.
  pub(crate) fn collect(context: Context, steps: Vec<StepMetadata>, any_failure: bool, stopped: bool) -> Self {
    let status = if !any_failure {
      Status::Success
    } else if stopped {
      Status::Failed
    } else {
      Status::Partial
    };
    Self { status, context, steps }
  }

  pub fn status(&self) -> Status {
    self.status
  }

  /// The shared context as left by the run. Call [`Context::snapshot`] for a
  /// frozen view.
  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn steps(&self) -> &[StepMetadata] {
    &self.steps
  }

  /// Metadata for the first executed step with the given name, if it ran.
  pub fn step(&self, name: &str) -> Option<&StepMetadata> {
    self.steps.iter().find(|meta| meta.step_name() == name)
  }
}
