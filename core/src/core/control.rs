// strand/src/core/control.rs

//! Defines signals for controlling pipeline flow and the outcome of a pipeline run.

/// What a step hands back to the fold on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl<T> {
  /// Feed this value into the next step.
  Continue(T),
  /// Stop the run here. The payload becomes the pipeline's result and no later step executes.
  /// This is a normal outcome, never an error.
  ShortCircuit(T),
}

impl<T> PipelineControl<T> {
  pub fn is_short_circuit(&self) -> bool {
    matches!(self, PipelineControl::ShortCircuit(_))
  }

  /// The carried value, whichever variant holds it.
  pub fn into_inner(self) -> T {
    match self {
      PipelineControl::Continue(value) | PipelineControl::ShortCircuit(value) => value,
    }
  }
}

/// Outcome of a full pipeline execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult<T> {
  /// Every step ran; this is the last step's output (or the input, for an empty pipeline).
  Completed(T),
  /// A step returned `PipelineControl::ShortCircuit`; this is its payload.
  ShortCircuited(T),
}

impl<T> PipelineResult<T> {
  pub fn is_short_circuited(&self) -> bool {
    matches!(self, PipelineResult::ShortCircuited(_))
  }

  pub fn into_inner(self) -> T {
    match self {
      PipelineResult::Completed(value) | PipelineResult::ShortCircuited(value) => value,
    }
  }
}
