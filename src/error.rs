// maestro/src/error.rs

use anyhow::Error as AnyhowError;
use std::any::Any;
use thiserror::Error;

/// Terminal failure of one step execution.
///
/// Step failures never propagate out of the engine as `Err`; they are
/// captured into the step's metadata and drive the stop/continue decision.
#[derive(Debug, Error)]
pub enum StepError {
  /// The step body returned an error. Subject to the step's retry policy;
  /// the terminal outcome is subject to its failure handler.
  #[error("step body failed: {source}")]
  Body {
    #[source]
    source: AnyhowError,
  },

  /// The step body (or the task running it) panicked.
  #[error("step body panicked: {message}")]
  Panicked { message: String },

  /// The task running the step was aborted before completion, e.g. during
  /// the inter-attempt backoff delay. Never silently swallowed: the abort
  /// becomes the step's terminal failure.
  #[error("step task was canceled before completion")]
  Canceled,
}

impl StepError {
  /// Maps a worker-task join fault onto the step failure taxonomy.
  pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
    if err.is_cancelled() {
      return StepError::Canceled;
    }
    match err.try_into_panic() {
      Ok(payload) => StepError::Panicked {
        message: panic_message(payload.as_ref()),
      },
      // try_into_panic only fails for a cancelled task
      Err(_) => StepError::Canceled,
    }
  }

  /// The underlying body error, when this failure came from the body.
  pub fn body(&self) -> Option<&AnyhowError> {
    match self {
      StepError::Body { source } => Some(source),
      _ => None,
    }
  }
}

/// Best-effort extraction of a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(msg) = payload.downcast_ref::<&str>() {
    (*msg).to_string()
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg.clone()
  } else {
    "opaque panic payload".to_string()
  }
}
