// src/lib.rs

//! Maestro: an in-process, type-safe step orchestration engine for Rust.
//!
//! Maestro executes a declared sequence of named steps against a shared typed
//! context, with:
//!  - Typed hand-off between steps via identity-keyed context slots.
//!  - Per-step retry policies (attempt limit, backoff, retryable-failure filter).
//!  - Per-step failure strategies: stop the whole run or continue past a failure.
//!  - Parallel step groups, joined before the next group starts.
//!  - Best-effort listeners observing every step, isolated from the run's outcome.
//!  - A complete, never-throwing execution report (status + context + per-step metadata).
//!
//! It is meant for single-process business-logic pipelines, not distributed
//! workflows: no persistence, no cross-process scheduling, no mid-step
//! cancellation.

pub mod core;
pub mod error;
pub mod listener;
pub mod pipeline;

// --- Re-exports for the Public API ---

// Core value types users interact with frequently
pub use crate::core::context::{Context, ContextSnapshot, Key};
pub use crate::core::control::{FailureStrategy, Status};
pub use crate::core::retry::RetryPolicy;
pub use crate::core::step::{FailureHandler, StepOptions, StepOptionsBuilder};

// The orchestrator and its fluent builders
pub use crate::pipeline::definition::{Orchestrator, OrchestratorBuilder, ParallelGroupBuilder};

// Execution records
pub use crate::pipeline::result::{OrchestrationResult, StepMetadata};

// Observation hooks and the listener-fault channel
pub use crate::listener::{FaultReporter, Hook, Listener, ListenerFault};

pub use crate::error::StepError;

/*
    Core Workflow:
    1. Create typed keys for the values your steps hand to each other:
       `let user = Key::<User>::new("user");`
    2. Assemble an `Orchestrator` with its builder, declaring steps in order:
       - `.step(key, |ctx| async { ... })` for value-producing steps,
       - `.task("name", |ctx| async { ... })` for effect-only steps,
       - `.parallel(|g| { g.step(..); g.task(..); })` for concurrent groups,
       - `StepOptions` / `RetryPolicy` for retry and failure behavior,
       - `.listener(..)` for observation.
    3. Call `orchestrator.execute().await` (or `execute_with` / `execute_on`).
    4. Inspect the returned `OrchestrationResult`: overall `status()`, the
       shared `context()`, and per-step `steps()` metadata. Failing steps
       never surface as errors from `execute`.
*/
