// maestro/src/core/control.rs

//! Signals controlling pipeline flow and the outcome of a full run.

/// Decision returned by a step's failure handler: whether a terminal step
/// failure halts the whole pipeline or lets subsequent groups proceed.
///
/// Internally this doubles as the step runner's continue/stop signal; a
/// successful step always signals [`FailureStrategy::Continue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStrategy {
  /// Halt the pipeline: no later group is started.
  Stop,
  /// Record the failure and keep executing subsequent groups.
  Continue,
}

/// Overall status of a finished orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  /// Every executed step succeeded.
  Success,
  /// At least one step failed, but every failure resolved to
  /// [`FailureStrategy::Continue`] and the group sequence ran to the end.
  Partial,
  /// At least one step failed and the run was halted by a
  /// [`FailureStrategy::Stop`] decision.
  Failed,
}
