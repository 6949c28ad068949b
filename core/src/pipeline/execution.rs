// strand/src/pipeline/execution.rs

//! The two fold engines over a pipeline's chain.
//!
//! `run` calls each step's body directly on the calling thread. `run_async` submits
//! each step's asynchronous body as its own unit of work and only submits step N+1
//! once step N has reported back. Both walk the live chain one link at a time and
//! feed every step outcome through `fold_step`, so they agree on continue,
//! short-circuit and failure.

use crate::core::action::{Action, ActionRef};
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::executor::schedule;
use crate::error::StrandError;
use crate::pipeline::definition::{Pipeline, PipelineKey};
use async_trait::async_trait;
use std::fmt::Debug;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use tracing::{event, instrument, span, Instrument, Level};

/// Applies one step's outcome to the run: keep folding with the new value, or stop
/// with the run's final result.
fn fold_step<K, T, E>(key: &K, outcome: Result<PipelineControl<T>, E>) -> ControlFlow<Result<PipelineResult<T>, E>, T>
where
  K: Debug,
  E: std::error::Error,
{
  match outcome {
    Ok(PipelineControl::Continue(value)) => {
      event!(Level::TRACE, "Step completed.");
      ControlFlow::Continue(value)
    }
    Ok(PipelineControl::ShortCircuit(payload)) => {
      event!(Level::INFO, step = ?key, "Pipeline short-circuited by step.");
      ControlFlow::Break(Ok(PipelineResult::ShortCircuited(payload)))
    }
    Err(e) => {
      event!(Level::ERROR, step = ?key, error = %e, "Step failed.");
      ControlFlow::Break(Err(e))
    }
  }
}

impl<K, T, E> Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  /// Folds `input` through every step on the calling thread and returns the final value.
  ///
  /// A short-circuit payload is returned as the value; `run` tells the two apart.
  pub fn execute(&self, input: T) -> Result<T, E> {
    self.run(input).map(PipelineResult::into_inner)
  }

  /// Asynchronous counterpart of `execute`. See `run_async`.
  pub async fn execute_async(&self, input: T) -> Result<T, E> {
    self.run_async(input).await.map(PipelineResult::into_inner)
  }

  /// Synchronous fold, reporting whether the run completed or was short-circuited.
  ///
  /// A step error aborts the run and is returned unchanged; steps already run are not
  /// compensated. A panicking step ends the run with `StrandError::TaskPanicked`,
  /// converted into `E`, exactly as the asynchronous engine reports it. The mutation lock is never held here, so concurrent mutation can
  /// change which steps a run observes.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.len()),
    err(Display)
  )]
  pub fn run(&self, input: T) -> Result<PipelineResult<T>, E> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut value = input;
    let mut cursor = self.first_key();

    while let Some(key) = cursor {
      let Some((body, observed_next)) = self.step_at(&key) else {
        event!(Level::DEBUG, step = ?key, "Step vanished before it was reached; ending run.");
        break;
      };
      let step_span = span!(Level::DEBUG, "pipeline_step", step = ?key);
      let flow = {
        let _step_span_guard = step_span.enter();
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| body.execute(value))) {
          Ok(outcome) => outcome,
          Err(_) => {
            let strand_err = StrandError::TaskPanicked {
              key: format!("{:?}", key),
            };
            event!(Level::ERROR, step = ?key, error = %strand_err, "Step could not be run.");
            return Err(E::from(strand_err));
          }
        };
        fold_step(&key, outcome)
      };
      match flow {
        ControlFlow::Continue(next) => value = next,
        ControlFlow::Break(done) => return done,
      }
      cursor = self.advance(&key, observed_next);
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed(value))
  }

  /// Asynchronous fold. Each step runs as a separate unit of work on the step's own
  /// executor, or on the pipeline's default one.
  ///
  /// Dropping the returned future cancels the run between steps: a unit that was
  /// already submitted still runs to completion, later steps are never submitted.
  #[instrument(
    name = "Pipeline::run_async",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.len()),
    err(Display)
  )]
  pub async fn run_async(&self, input: T) -> Result<PipelineResult<T>, E> {
    event!(Level::DEBUG, "Asynchronous pipeline execution starting.");
    let mut value = input;
    let mut cursor = self.first_key();

    while let Some(key) = cursor {
      let Some((body, observed_next)) = self.step_at(&key) else {
        event!(Level::DEBUG, step = ?key, "Step vanished before it was reached; ending run.");
        break;
      };
      let executor = body.executor().unwrap_or_else(|| self.executor.clone());
      let label = format!("{:?}", key);
      let step_span = span!(Level::DEBUG, "pipeline_step", step = %label);

      let work = async move { body.execute_async(value).await }.instrument(step_span.clone());
      let outcome = match schedule(executor.as_ref(), &label, work).join().await {
        Ok(outcome) => outcome,
        Err(strand_err) => {
          event!(Level::ERROR, step = %label, error = %strand_err, "Step could not be run.");
          return Err(E::from(strand_err));
        }
      };

      match step_span.in_scope(|| fold_step(&key, outcome)) {
        ControlFlow::Continue(next) => value = next,
        ControlFlow::Break(done) => return done,
      }
      cursor = self.advance(&key, observed_next);
    }

    event!(Level::DEBUG, "Asynchronous pipeline execution completed.");
    Ok(PipelineResult::Completed(value))
  }

  fn step_at(&self, key: &K) -> Option<(ActionRef<T, E>, Option<K>)> {
    self.chain.read().step(key)
  }

  /// Where the cursor goes after `key` ran: its live successor, or the successor seen
  /// before it ran if the step was removed meanwhile.
  pub(crate) fn advance(&self, key: &K, observed_next: Option<K>) -> Option<K> {
    let live = self.chain.read().successor(key);
    live.unwrap_or(observed_next)
  }
}

/// A pipeline can be a step of another pipeline.
///
/// The inner run's result, short-circuited or not, is passed on to the outer
/// pipeline's next step; an inner short-circuit only ends the inner pipeline.
#[async_trait]
impl<K, T, E> Action<T, E> for Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  fn execute(&self, input: T) -> Result<PipelineControl<T>, E> {
    Pipeline::<K, T, E>::execute(self, input).map(PipelineControl::Continue)
  }

  async fn execute_async(&self, input: T) -> Result<PipelineControl<T>, E> {
    Pipeline::<K, T, E>::execute_async(self, input)
      .await
      .map(PipelineControl::Continue)
  }
}
