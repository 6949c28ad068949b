// strand/src/core/executor.rs

//! The scheduling seam used by the asynchronous engine.
//!
//! An `Executor` accepts one unit of work and returns a `Completion` that resolves once
//! the unit has finished. `schedule` pairs a submission with a oneshot channel so the
//! caller gets a typed `TaskHandle` back, whatever executor actually ran the work.

use crate::error::StrandError;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tracing::{event, Level};

/// A unit of work submitted to an executor.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Resolves when a submitted `Task` has run to completion (or could not be run).
pub type Completion = Pin<Box<dyn Future<Output = Result<(), StrandError>> + Send + 'static>>;

/// Something that can run a `Task` somewhere.
///
/// `label` identifies the unit (the step key) for error reporting only.
pub trait Executor: Send + Sync {
  fn submit(&self, label: &str, task: Task) -> Completion;
}

/// Handle to the eventual result of a scheduled unit of work.
pub struct TaskHandle<R> {
  label: String,
  completion: Completion,
  result: oneshot::Receiver<R>,
}

impl<R> TaskHandle<R> {
  /// Waits for the unit of work and returns what it produced.
  ///
  /// Dropping the future returned here does not stop a unit that an executor already
  /// spawned; it only stops waiting for it.
  pub async fn join(self) -> Result<R, StrandError> {
    let TaskHandle {
      label,
      completion,
      result,
    } = self;
    completion.await?;
    result.await.map_err(|_| StrandError::TaskAborted { key: label })
  }
}

/// Submits `work` to `executor` and returns a handle to its output.
pub fn schedule<F, R>(executor: &dyn Executor, label: &str, work: F) -> TaskHandle<R>
where
  F: Future<Output = R> + Send + 'static,
  R: Send + 'static,
{
  let (tx, rx) = oneshot::channel();
  let task: Task = Box::pin(async move {
    // The receiver is gone if the run was cancelled while this unit was in flight.
    let _ = tx.send(work.await);
  });
  TaskHandle {
    label: label.to_string(),
    completion: executor.submit(label, task),
    result: rx,
  }
}

fn join_error(key: String, err: JoinError) -> StrandError {
  if err.is_panic() {
    StrandError::TaskPanicked { key }
  } else {
    StrandError::TaskAborted { key }
  }
}

/// Spawns each unit onto a tokio runtime. This is the default execution context.
///
/// Without an explicit handle the runtime is looked up when a unit is submitted, so a
/// pipeline built outside any runtime can still be run from inside one.
#[derive(Debug, Clone, Default)]
pub struct TokioExecutor {
  handle: Option<Handle>,
}

impl TokioExecutor {
  /// Uses whichever runtime is current at submit time.
  pub fn current() -> Self {
    Self { handle: None }
  }

  pub fn with_handle(handle: Handle) -> Self {
    Self { handle: Some(handle) }
  }

  fn resolve(&self) -> Option<Handle> {
    self.handle.clone().or_else(|| Handle::try_current().ok())
  }
}

impl Executor for TokioExecutor {
  fn submit(&self, label: &str, task: Task) -> Completion {
    let label = label.to_string();
    match self.resolve() {
      Some(handle) => {
        let join = handle.spawn(task);
        Box::pin(async move { join.await.map_err(|e| join_error(label, e)) })
      }
      None => Box::pin(async move { Err(StrandError::NoRuntime { key: label }) }),
    }
  }
}

/// Runs each unit on tokio's blocking thread pool, driving it to completion there.
///
/// Meant for steps whose body blocks the thread (file I/O, heavy CPU work) and would
/// otherwise stall the async workers.
#[derive(Debug, Clone, Default)]
pub struct BlockingExecutor {
  handle: Option<Handle>,
}

impl BlockingExecutor {
  pub fn current() -> Self {
    Self { handle: None }
  }

  pub fn with_handle(handle: Handle) -> Self {
    Self { handle: Some(handle) }
  }
}

impl Executor for BlockingExecutor {
  fn submit(&self, label: &str, task: Task) -> Completion {
    let label = label.to_string();
    let handle = match self.handle.clone().or_else(|| Handle::try_current().ok()) {
      Some(handle) => handle,
      None => return Box::pin(async move { Err(StrandError::NoRuntime { key: label }) }),
    };
    let runtime = handle.clone();
    let join = handle.spawn_blocking(move || runtime.block_on(task));
    Box::pin(async move { join.await.map_err(|e| join_error(label, e)) })
  }
}

/// Runs each unit on the task that awaits it. No thread hop, no runtime required.
///
/// A unit that is still unfinished when its completion is dropped (the run was
/// cancelled) is handed to the current tokio runtime, or to a private one on its own
/// thread, and runs to completion there. A panic while polling the unit is reported
/// as `StrandError::TaskPanicked`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
  fn submit(&self, label: &str, task: Task) -> Completion {
    Box::pin(InlineCompletion {
      label: label.to_string(),
      task: Some(task),
    })
  }
}

struct InlineCompletion {
  label: String,
  /// `None` once the unit finished or panicked.
  task: Option<Task>,
}

impl Future for InlineCompletion {
  type Output = Result<(), StrandError>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let Some(task) = self.task.as_mut() else {
      return Poll::Ready(Ok(()));
    };
    match panic::catch_unwind(AssertUnwindSafe(|| task.as_mut().poll(cx))) {
      Ok(Poll::Pending) => Poll::Pending,
      Ok(Poll::Ready(())) => {
        self.task = None;
        Poll::Ready(Ok(()))
      }
      Err(_) => {
        self.task = None;
        Poll::Ready(Err(StrandError::TaskPanicked {
          key: self.label.clone(),
        }))
      }
    }
  }
}

impl Drop for InlineCompletion {
  fn drop(&mut self) {
    let Some(task) = self.task.take() else {
      return;
    };
    event!(Level::DEBUG, step = %self.label, "Inline unit abandoned mid-flight; finishing it in the background.");
    match Handle::try_current() {
      Ok(handle) => {
        handle.spawn(task);
      }
      Err(_) => {
        let label = self.label.clone();
        let spawned = std::thread::Builder::new()
          .name(format!("strand-inline-{}", label))
          .spawn(move || match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(task),
            Err(e) => event!(Level::ERROR, step = %label, error = %e, "Could not build a runtime for an abandoned unit."),
          });
        if let Err(e) = spawned {
          event!(Level::ERROR, step = %self.label, error = %e, "Could not start a thread for an abandoned unit.");
        }
      }
    }
  }
}
