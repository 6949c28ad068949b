// strand/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the pipeline itself, as opposed to errors raised by a step's body.
///
/// Structural variants (`DuplicateKey`, `KeyNotFound`, `KeyCollision`) are returned
/// synchronously by the mutator that caused them, and the pipeline is left exactly as
/// it was before the call. The task variants only surface during an asynchronous run,
/// converted into the pipeline's step error type through `From<StrandError>`.
#[derive(Debug, Error)]
pub enum StrandError {
  #[error("Pipeline already contains key {key}")]
  DuplicateKey { key: String },

  #[error("Pipeline does not contain key {key}")]
  KeyNotFound { key: String },

  #[error("Cannot splice pipeline: keys already present in the receiver: {}", keys.join(", "))]
  KeyCollision { keys: Vec<String> },

  #[error("No tokio runtime is available to schedule step '{key}'")]
  NoRuntime { key: String },

  #[error("Unit of work for step '{key}' was dropped before reporting a result")]
  TaskAborted { key: String },

  #[error("Step '{key}' panicked")]
  TaskPanicked { key: String },

  #[error("Error in user-provided action or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },
}

impl StrandError {
  pub(crate) fn duplicate_key<K: std::fmt::Debug>(key: &K) -> Self {
    StrandError::DuplicateKey { key: format!("{:?}", key) }
  }

  pub(crate) fn key_not_found<K: std::fmt::Debug>(key: &K) -> Self {
    StrandError::KeyNotFound { key: format!("{:?}", key) }
  }

  /// True for the errors a mutator reports when it refuses to change the structure.
  pub fn is_structural(&self) -> bool {
    matches!(
      self,
      StrandError::DuplicateKey { .. } | StrandError::KeyNotFound { .. } | StrandError::KeyCollision { .. }
    )
  }
}

impl From<AnyhowError> for StrandError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a StrandError that travelled through anyhow instead of nesting it.
    match err.downcast::<StrandError>() {
      Ok(strand_err) => strand_err,
      Err(source) => StrandError::HandlerError { source },
    }
  }
}

pub type StrandResult<T, E = StrandError> = std::result::Result<T, E>;
