// maestro/src/listener.rs

//! Observation hooks for step execution, and the panic-isolated dispatch the
//! engine uses to invoke them.
//!
//! Listeners are strictly best-effort: a hook that panics is caught at the
//! dispatch site, forwarded to the run's fault reporter, and never affects
//! the step's outcome or the pipeline's status.

use crate::core::context::Context;
use crate::error::{panic_message, StepError};
use crate::pipeline::result::StepMetadata;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{event, Level};

/// Observer of step execution. All hooks default to no-ops, so implementers
/// supply only the subset they care about.
///
/// Hooks run synchronously on whichever task executes the step (for a
/// parallel group, each member's task invokes them for that member). Keep
/// them fast; they sit on the execution path.
pub trait Listener: Send + Sync {
  /// Invoked before the first attempt of a step.
  fn before_step(&self, _step_name: &str, _context: &Context) {}

  /// Invoked after a step succeeded.
  fn after_step(&self, _step_name: &str, _context: &Context, _metadata: &StepMetadata) {}

  /// Invoked after a step terminally failed, before its failure handler is
  /// consulted.
  fn on_failure(&self, _step_name: &str, _failure: &StepError, _context: &Context, _metadata: &StepMetadata) {}
}

/// Which hook a listener fault escaped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
  BeforeStep,
  AfterStep,
  OnFailure,
}

/// Report of a listener hook that panicked during dispatch.
#[derive(Debug, Clone)]
pub struct ListenerFault {
  pub hook: Hook,
  pub step_name: String,
  pub message: String,
}

/// Sink for listener faults, injected per orchestrator. The default reporter
/// logs at WARN via `tracing`.
pub type FaultReporter = Arc<dyn Fn(&ListenerFault) + Send + Sync>;

pub(crate) fn default_fault_reporter() -> FaultReporter {
  Arc::new(|fault: &ListenerFault| {
    event!(
      Level::WARN,
      hook = ?fault.hook,
      step_name = %fault.step_name,
      message = %fault.message,
      "Listener hook panicked; ignoring."
    );
  })
}

/// Invokes `hook_fn` once per listener, in registration order, isolating
/// panics so a faulty listener cannot abort the step.
pub(crate) fn dispatch(
  listeners: &[Arc<dyn Listener>],
  reporter: &FaultReporter,
  hook: Hook,
  step_name: &str,
  hook_fn: impl Fn(&dyn Listener),
) {
  for listener in listeners {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| hook_fn(listener.as_ref()))) {
      let fault = ListenerFault {
        hook,
        step_name: step_name.to_string(),
        message: panic_message(payload.as_ref()),
      };
      reporter(&fault);
    }
  }
}
