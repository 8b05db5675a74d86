// maestro/src/pipeline/mod.rs

//! The `Orchestrator`: its definition/builders, the execution engine, and
//! the result types a run produces.

pub mod definition;
pub mod execution;
pub mod result;

pub use definition::{Orchestrator, OrchestratorBuilder, ParallelGroupBuilder};
pub use result::{OrchestrationResult, StepMetadata};
