// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use maestro::{Context, Listener, StepError, StepMetadata};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::Level;

// --- Common Error Types for Tests ---
#[derive(Debug, thiserror::Error)]
pub enum TestError {
  #[error("transient failure: {0}")]
  Transient(String),

  #[error("fatal failure: {0}")]
  Fatal(String),
}

// Distinct error types for exercising the retryable-failure filter.
#[derive(Debug, thiserror::Error)]
#[error("transient glitch")]
pub struct TransientGlitch;

#[derive(Debug, thiserror::Error)]
#[error("hard failure")]
pub struct HardFailure;

// --- Listener that records every hook invocation in order ---
pub struct RecordingListener {
  label: &'static str,
  pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingListener {
  pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    (Self::labeled("", Arc::clone(&events)), events)
  }

  /// A listener tagging its records, for tests asserting registration order
  /// across several listeners sharing one event log.
  pub fn labeled(label: &'static str, events: Arc<Mutex<Vec<String>>>) -> Self {
    Self { label, events }
  }

  fn record(&self, hook: &str, step_name: &str) {
    let entry = if self.label.is_empty() {
      format!("{hook}({step_name})")
    } else {
      format!("{}:{hook}({step_name})", self.label)
    };
    self.events.lock().push(entry);
  }
}

impl Listener for RecordingListener {
  fn before_step(&self, step_name: &str, _context: &Context) {
    self.record("before", step_name);
  }

  fn after_step(&self, step_name: &str, _context: &Context, _metadata: &StepMetadata) {
    self.record("after", step_name);
  }

  fn on_failure(&self, step_name: &str, _failure: &StepError, _context: &Context, _metadata: &StepMetadata) {
    self.record("on_failure", step_name);
  }
}

// --- Listener that panics on every hook, for isolation tests ---
pub struct PanickingListener;

impl Listener for PanickingListener {
  fn before_step(&self, step_name: &str, _context: &Context) {
    panic!("before_step listener panic for {step_name}");
  }

  fn after_step(&self, step_name: &str, _context: &Context, _metadata: &StepMetadata) {
    panic!("after_step listener panic for {step_name}");
  }

  fn on_failure(&self, step_name: &str, _failure: &StepError, _context: &Context, _metadata: &StepMetadata) {
    panic!("on_failure listener panic for {step_name}");
  }
}

/// A step body tail that always panics, typed so async blocks using it still
/// infer a `Result` output.
pub fn detonate(msg: &str) -> Result<(), anyhow::Error> {
  panic!("{msg}")
}

// --- Shared attempt counters ---
pub fn new_counter() -> Arc<AtomicU32> {
  Arc::new(AtomicU32::new(0))
}

pub fn bump(counter: &Arc<AtomicU32>) -> u32 {
  counter.fetch_add(1, Ordering::SeqCst) + 1
}

pub fn count(counter: &Arc<AtomicU32>) -> u32 {
  counter.load(Ordering::SeqCst)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
