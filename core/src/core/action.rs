// strand/src/core/action.rs

//! Defines the `Action<T, E>` capability bound to every pipeline step, plus adapters
//! for building actions from closures and composing them.

use crate::core::control::PipelineControl;
use crate::core::executor::Executor;
use async_trait::async_trait;
use std::sync::Arc;

/// A unary, possibly-failing transformation `T -> T`.
///
/// `execute` is the synchronous form used by `Pipeline::execute`. `execute_async` is the
/// form the asynchronous engine awaits inside a scheduled unit of work; by default it
/// simply calls `execute`, so implementors only override it when they have real
/// asynchronous work to do.
///
/// Returning `Ok(PipelineControl::ShortCircuit(payload))` ends the run with `payload` as
/// its result. Returning `Err(e)` aborts the run and hands `e` to the caller unchanged.
#[async_trait]
pub trait Action<T, E>: Send + Sync
where
  T: Send + 'static,
  E: Send + 'static,
{
  fn execute(&self, input: T) -> Result<PipelineControl<T>, E>;

  async fn execute_async(&self, input: T) -> Result<PipelineControl<T>, E> {
    self.execute(input)
  }

  /// The executor this step wants its asynchronous invocation scheduled on.
  /// `None` means the pipeline's default execution context.
  fn executor(&self) -> Option<Arc<dyn Executor>> {
    None
  }
}

/// Shared handle to an action. Links hold these, so duplicating a link never copies the action.
pub type ActionRef<T, E> = Arc<dyn Action<T, E>>;

/// An action backed by a closure returning `PipelineControl`.
pub struct FnAction<F> {
  f: F,
}

impl<T, E, F> Action<T, E> for FnAction<F>
where
  T: Send + 'static,
  E: Send + 'static,
  F: Fn(T) -> Result<PipelineControl<T>, E> + Send + Sync + 'static,
{
  fn execute(&self, input: T) -> Result<PipelineControl<T>, E> {
    (self.f)(input)
  }
}

/// Wraps a closure that decides for itself whether to continue or short-circuit.
pub fn from_fn<T, E, F>(f: F) -> ActionRef<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
  F: Fn(T) -> Result<PipelineControl<T>, E> + Send + Sync + 'static,
{
  Arc::new(FnAction { f })
}

/// Wraps a plain transformation. The result always continues to the next step.
pub fn map<T, E, F>(f: F) -> ActionRef<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
  F: Fn(T) -> Result<T, E> + Send + Sync + 'static,
{
  from_fn(move |input| f(input).map(PipelineControl::Continue))
}

/// A guard step: when `predicate` holds for the input, the run ends with `payload(input)`;
/// otherwise the input passes through untouched.
pub fn short_circuit_if<T, E, P, B>(predicate: P, payload: B) -> ActionRef<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
  P: Fn(&T) -> bool + Send + Sync + 'static,
  B: Fn(T) -> T + Send + Sync + 'static,
{
  from_fn(move |input| {
    if predicate(&input) {
      Ok(PipelineControl::ShortCircuit(payload(input)))
    } else {
      Ok(PipelineControl::Continue(input))
    }
  })
}

/// An action that returns its input.
pub fn identity<T, E>() -> ActionRef<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  from_fn(|input| Ok(PipelineControl::Continue(input)))
}

/// Runs `first`, then feeds its output to `second`.
///
/// A short-circuit from `first` skips `second` and is passed on as-is.
pub fn then<T, E>(first: ActionRef<T, E>, second: ActionRef<T, E>) -> ActionRef<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  Arc::new(Then { first, second })
}

struct Then<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  first: ActionRef<T, E>,
  second: ActionRef<T, E>,
}

#[async_trait]
impl<T, E> Action<T, E> for Then<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  fn execute(&self, input: T) -> Result<PipelineControl<T>, E> {
    match self.first.execute(input)? {
      PipelineControl::Continue(value) => self.second.execute(value),
      stop => Ok(stop),
    }
  }

  async fn execute_async(&self, input: T) -> Result<PipelineControl<T>, E> {
    match self.first.execute_async(input).await? {
      PipelineControl::Continue(value) => self.second.execute_async(value).await,
      stop => Ok(stop),
    }
  }
}

/// Declares `executor` as the place `action`'s asynchronous invocation is scheduled.
pub fn with_executor<T, E>(action: ActionRef<T, E>, executor: Arc<dyn Executor>) -> ActionRef<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  Arc::new(WithExecutor {
    inner: action,
    executor,
  })
}

struct WithExecutor<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  inner: ActionRef<T, E>,
  executor: Arc<dyn Executor>,
}

#[async_trait]
impl<T, E> Action<T, E> for WithExecutor<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  fn execute(&self, input: T) -> Result<PipelineControl<T>, E> {
    self.inner.execute(input)
  }

  async fn execute_async(&self, input: T) -> Result<PipelineControl<T>, E> {
    self.inner.execute_async(input).await
  }

  fn executor(&self) -> Option<Arc<dyn Executor>> {
    Some(self.executor.clone())
  }
}
