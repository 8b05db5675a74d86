// tests/execution_tests.rs
mod common; // Reference the common module

use common::*;
use maestro::{Context, FailureStrategy, Key, Orchestrator, Status, StepOptions};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_steps_run_sequentially_in_declared_order() {
  setup_tracing();
  let (listener, events) = RecordingListener::new();

  let orchestrator = Orchestrator::builder()
    .task("step-1", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .task("step-2", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .task("step-3", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .listener(listener)
    .build();

  let result = orchestrator.execute().await;

  assert_eq!(result.status(), Status::Success);
  assert_eq!(result.steps().len(), 3);

  let names: Vec<&str> = result.steps().iter().map(|m| m.step_name()).collect();
  assert_eq!(names, vec!["step-1", "step-2", "step-3"]);
  for meta in result.steps() {
    assert!(meta.is_success());
    assert!(meta.failure().is_none());
    assert_eq!(meta.attempts(), 1);
    assert!(meta.ended_at() >= meta.started_at());
  }

  let order: Vec<String> = events.lock().clone();
  assert_eq!(
    order,
    vec![
      "before(step-1)",
      "after(step-1)",
      "before(step-2)",
      "after(step-2)",
      "before(step-3)",
      "after(step-3)",
    ]
  );
}

#[tokio::test]
#[serial]
async fn test_typed_values_flow_between_steps() {
  setup_tracing();
  let greeting = Key::<String>::new("greeting");
  let length = Key::<usize>::new("length");

  let greeting_for_step = greeting.clone();
  let orchestrator = Orchestrator::builder()
    .step(greeting.clone(), |_ctx: Context| async move {
      Ok::<_, anyhow::Error>("hello".to_string())
    })
    .step(length.clone(), move |ctx: Context| {
      let greeting = greeting_for_step.clone();
      async move {
        let value = ctx.get(&greeting).expect("greeting must be visible to later steps");
        Ok::<_, anyhow::Error>(value.len())
      }
    })
    .build();

  let result = orchestrator.execute().await;

  assert_eq!(result.status(), Status::Success);
  assert_eq!(result.context().get(&greeting).as_deref(), Some(&"hello".to_string()));
  assert_eq!(result.context().get(&length).as_deref(), Some(&5));
}

#[tokio::test]
#[serial]
async fn test_default_stop_strategy_halts_run_and_marks_failed() {
  setup_tracing();
  let third_ran = new_counter();
  let third_ran_probe = third_ran.clone();

  let orchestrator = Orchestrator::builder()
    .task("step-1", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .task("step-2", |_ctx: Context| async move {
      Err::<(), anyhow::Error>(TestError::Fatal("boom".into()).into())
    })
    .task("step-3", move |_ctx: Context| {
      let third_ran = third_ran_probe.clone();
      async move {
        bump(&third_ran);
        Ok::<(), anyhow::Error>(())
      }
    })
    .build();

  let result = orchestrator.execute().await;

  assert_eq!(result.status(), Status::Failed);
  assert_eq!(result.steps().len(), 2); // step-3 never produced metadata
  assert_eq!(count(&third_ran), 0);

  let failed = &result.steps()[1];
  assert!(!failed.is_success());
  assert_eq!(failed.step_name(), "step-2");
  let failure = failed.failure().expect("terminal failure must be recorded");
  assert!(failure.to_string().contains("boom"));
}

#[tokio::test]
#[serial]
async fn test_continue_strategy_runs_remaining_steps_and_marks_partial() {
  setup_tracing();
  let third_ran = new_counter();
  let third_ran_probe = third_ran.clone();

  let orchestrator = Orchestrator::builder()
    .task("step-1", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .task_with(
      "step-2",
      |_ctx: Context| async move { Err::<(), anyhow::Error>(TestError::Fatal("boom".into()).into()) },
      StepOptions::builder().failure_strategy(FailureStrategy::Continue).build(),
    )
    .task("step-3", move |_ctx: Context| {
      let third_ran = third_ran_probe.clone();
      async move {
        bump(&third_ran);
        Ok::<(), anyhow::Error>(())
      }
    })
    .build();

  let result = orchestrator.execute().await;

  assert_eq!(result.status(), Status::Partial);
  assert_eq!(result.steps().len(), 3);
  assert_eq!(count(&third_ran), 1);
  assert!(!result.steps()[1].is_success());
  assert!(result.steps()[2].is_success());
}

#[tokio::test]
#[serial]
async fn test_failure_handler_sees_failure_and_context() {
  setup_tracing();
  let marker = Key::<String>::new("marker");
  let marker_for_handler = marker.clone();

  let orchestrator = Orchestrator::builder()
    .step(marker.clone(), |_ctx: Context| async move {
      Ok::<_, anyhow::Error>("present".to_string())
    })
    .task_with(
      "flaky",
      |_ctx: Context| async move { Err::<(), anyhow::Error>(TestError::Transient("wobble".into()).into()) },
      StepOptions::builder()
        .on_failure(move |failure, ctx| {
          // Continue only when the failure is the transient kind and the
          // marker from the earlier step is visible.
          let transient = failure
            .body()
            .and_then(|err| err.downcast_ref::<TestError>())
            .map(|err| matches!(err, TestError::Transient(_)))
            .unwrap_or(false);
          if transient && ctx.contains(&marker_for_handler) {
            FailureStrategy::Continue
          } else {
            FailureStrategy::Stop
          }
        })
        .build(),
    )
    .task("tail", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .build();

  let result = orchestrator.execute().await;

  assert_eq!(result.status(), Status::Partial);
  assert_eq!(result.steps().len(), 3);
}

#[tokio::test]
#[serial]
async fn test_failed_producing_step_stores_nothing() {
  setup_tracing();
  let output = Key::<u32>::new("output");

  let orchestrator = Orchestrator::builder()
    .step(output.clone(), |_ctx: Context| async move {
      Err::<u32, anyhow::Error>(TestError::Fatal("no value".into()).into())
    })
    .build();

  let result = orchestrator.execute().await;

  assert_eq!(result.status(), Status::Failed);
  assert!(!result.context().contains(&output));
  assert!(result.context().is_empty());
}

#[tokio::test]
#[serial]
async fn test_empty_pipeline_succeeds_with_no_metadata() {
  setup_tracing();
  let orchestrator = Orchestrator::builder().build();

  let result = orchestrator.execute().await;

  assert_eq!(result.status(), Status::Success);
  assert!(result.steps().is_empty());
}

#[tokio::test]
#[serial]
async fn test_orchestrator_is_reusable_across_runs() {
  setup_tracing();
  let runs = new_counter();
  let runs_probe = runs.clone();

  let orchestrator = Orchestrator::builder()
    .task("work", move |_ctx: Context| {
      let runs = runs_probe.clone();
      async move {
        bump(&runs);
        Ok::<(), anyhow::Error>(())
      }
    })
    .build();

  let first = orchestrator.execute().await;
  let second = orchestrator.execute().await;

  assert_eq!(first.status(), Status::Success);
  assert_eq!(second.status(), Status::Success);
  assert_eq!(count(&runs), 2);
  // Each run gets its own fresh context.
  assert!(first.context().is_empty());
  assert!(second.context().is_empty());
}

#[tokio::test]
#[serial]
async fn test_result_step_lookup_by_name() {
  setup_tracing();
  let orchestrator = Orchestrator::builder()
    .task("alpha", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .task("beta", |_ctx: Context| async move { Ok::<(), anyhow::Error>(()) })
    .build();

  let result = orchestrator.execute().await;

  assert!(result.step("alpha").is_some());
  assert!(result.step("beta").is_some());
  assert!(result.step("gamma").is_none());
}
