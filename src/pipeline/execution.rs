// maestro/src/pipeline/execution.rs

//! The execution engine: the step runner (retry loop + listener hooks +
//! failure decision for one step) and the group scheduler that walks the
//! declared group sequence, running single-step groups inline and multi-step
//! groups concurrently on worker tasks.

use crate::core::context::Context;
use crate::core::control::FailureStrategy;
use crate::core::step::StepDef;
use crate::error::StepError;
use crate::listener::{self, FaultReporter, Hook, Listener};
use crate::pipeline::definition::Orchestrator;
use crate::pipeline::result::{OrchestrationResult, StepMetadata};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{event, instrument, span, Instrument, Level};

/// What the step runner hands back to the scheduler: the step's immutable
/// execution record plus the continue/stop signal. A successful step always
/// signals `Continue`; a failed step signals its failure handler's decision.
pub(crate) struct StepOutcome {
  pub(crate) metadata: StepMetadata,
  pub(crate) control: FailureStrategy,
}

/// Executes a single step under its retry policy. This is the unit of
/// concurrency: parallel group members each run one of these on their own
/// worker task.
///
/// Takes owned clones of everything it touches so it can be spawned as a
/// `'static` task; all the clones are cheap `Arc` bumps.
pub(crate) async fn run_step(
  step: Arc<StepDef>,
  ctx: Context,
  listeners: Vec<Arc<dyn Listener>>,
  reporter: FaultReporter,
) -> StepOutcome {
  let step_name = step.name().to_string();

  listener::dispatch(&listeners, &reporter, Hook::BeforeStep, &step_name, |l| {
    l.before_step(&step_name, &ctx)
  });

  let policy = &step.options.retry;
  let max_attempts = policy.max_attempts();
  let started_at = Instant::now();
  let mut attempts = 0u32;

  // max_attempts >= 1 is enforced at policy construction, so the loop always
  // runs the body at least once and `attempts` ends at >= 1.
  let outcome: Result<(), StepError> = loop {
    attempts += 1;
    event!(Level::TRACE, attempt = attempts, "Invoking step body.");
    match (step.body)(ctx.clone()).await {
      Ok(()) => break Ok(()),
      Err(err) => {
        if attempts >= max_attempts || !policy.is_retryable(&err) {
          break Err(StepError::Body { source: err });
        }
        event!(Level::WARN, attempt = attempts, error = %err, "Step attempt failed; will retry.");
        let backoff = policy.backoff();
        if !backoff.is_zero() {
          tokio::time::sleep(backoff).await;
        }
      }
    }
  };
  let ended_at = Instant::now();

  match outcome {
    Ok(()) => {
      let metadata = StepMetadata::succeeded(step_name.clone(), started_at, ended_at, attempts);
      listener::dispatch(&listeners, &reporter, Hook::AfterStep, &step_name, |l| {
        l.after_step(&step_name, &ctx, &metadata)
      });
      event!(Level::DEBUG, attempts, "Step succeeded.");
      StepOutcome {
        metadata,
        control: FailureStrategy::Continue,
      }
    }
    Err(failure) => {
      let failure = Arc::new(failure);
      let metadata = StepMetadata::failed(step_name.clone(), started_at, ended_at, attempts, Arc::clone(&failure));
      listener::dispatch(&listeners, &reporter, Hook::OnFailure, &step_name, |l| {
        l.on_failure(&step_name, &failure, &ctx, &metadata)
      });
      let decision = (step.options.on_failure)(&failure, &ctx);
      event!(Level::DEBUG, attempts, error = %failure, decision = ?decision, "Step failed terminally.");
      StepOutcome {
        metadata,
        control: decision,
      }
    }
  }
}

impl Orchestrator {
  /// Runs the pipeline against a fresh, empty context.
  pub async fn execute(&self) -> OrchestrationResult {
    self.run(Context::new(), None).await
  }

  /// Runs the pipeline against a caller-supplied context.
  pub async fn execute_with(&self, context: Context) -> OrchestrationResult {
    self.run(context, None).await
  }

  /// Runs the pipeline, spawning parallel group members on the given runtime
  /// handle instead of the ambient runtime. The handle's lifecycle stays
  /// entirely with the caller.
  pub async fn execute_on(&self, context: Context, handle: Handle) -> OrchestrationResult {
    self.run(context, Some(handle)).await
  }

  /// The group scheduler. Walks groups in declaration order, halting before
  /// any group that follows a stop-signalling one. Step failures never
  /// escape as errors; the caller always gets a complete result.
  #[instrument(
    name = "Orchestrator::execute",
    skip_all,
    fields(num_groups = self.groups.len(), num_listeners = self.listeners.len())
  )]
  async fn run(&self, context: Context, pool: Option<Handle>) -> OrchestrationResult {
    event!(Level::DEBUG, "Orchestration starting.");

    let mut steps: Vec<StepMetadata> = Vec::new();
    let mut any_failure = false;
    let mut stopped = false;

    for (group_idx, group) in self.groups.iter().enumerate() {
      if let [step] = group.as_slice() {
        // The common case: no task dispatch, run on the caller's task.
        let step_span = span!(Level::INFO, "step", step_name = %step.name(), group_index = group_idx);
        let outcome = run_step(
          Arc::clone(step),
          context.clone(),
          self.listeners.clone(),
          Arc::clone(&self.fault_reporter),
        )
        .instrument(step_span)
        .await;

        any_failure |= !outcome.metadata.is_success();
        stopped |= outcome.control == FailureStrategy::Stop;
        steps.push(outcome.metadata);
      } else {
        // Multi-step group: dispatch every member at once, then join in
        // declaration order so the reported metadata order is deterministic.
        let mut members = Vec::with_capacity(group.len());
        for step in group {
          let step_span = span!(
            Level::INFO,
            "step",
            step_name = %step.name(),
            group_index = group_idx,
            parallel = true
          );
          let fut = run_step(
            Arc::clone(step),
            context.clone(),
            self.listeners.clone(),
            Arc::clone(&self.fault_reporter),
          )
          .instrument(step_span);
          let handle = match &pool {
            Some(handle) => handle.spawn(fut),
            None => tokio::spawn(fut),
          };
          members.push((step.name().to_string(), handle));
        }

        let mut group_stop = false;
        for (member_name, handle) in members {
          match handle.await {
            Ok(outcome) => {
              any_failure |= !outcome.metadata.is_success();
              group_stop |= outcome.control == FailureStrategy::Stop;
              steps.push(outcome.metadata);
            }
            Err(join_err) => {
              // A fault at the worker level, outside the step's own failure
              // handling. Partial results from a half-joined group cannot be
              // trusted, so the whole group counts as failed and stopped.
              event!(
                Level::WARN,
                step_name = %member_name,
                error = %join_err,
                "Worker task fault in parallel group; halting run."
              );
              let now = Instant::now();
              steps.push(StepMetadata::failed(
                member_name,
                now,
                now,
                0,
                Arc::new(StepError::from_join(join_err)),
              ));
              any_failure = true;
              group_stop = true;
            }
          }
        }
        stopped |= group_stop;
      }

      if stopped {
        event!(Level::INFO, group_index = group_idx, "Run halted by stop decision.");
        break;
      }
    }

    event!(Level::DEBUG, executed_steps = steps.len(), any_failure, stopped, "Orchestration finished.");
    OrchestrationResult::collect(context, steps, any_failure, stopped)
  }
}
