pub mod context;
pub mod control;
pub mod retry;
pub mod step;

// Re-export key types for easier access from other maestro modules
pub use context::{Context, ContextSnapshot, Key};
pub use control::{FailureStrategy, Status};
pub use retry::RetryPolicy;
pub use step::{FailureHandler, StepDef, StepOptions, StepOptionsBuilder};
