// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;
use strand::{action, Action, ActionRef, Completion, Executor, Pipeline, PipelineControl, StrandError, Task};
use tracing_subscriber::EnvFilter;

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)] // Clone, PartialEq, Eq for assertions
pub enum TestError {
  #[error("Strand framework error: {0}")]
  Strand(String), // Store as String for Eq comparison

  #[error("Test step failed: {0}")]
  Step(String),
}

impl From<StrandError> for TestError {
  fn from(se: StrandError) -> Self {
    TestError::Strand(format!("{:?}", se))
  }
}

pub type NumPipeline = Pipeline<&'static str, i64, TestError>;

// --- Values for pipelines that mix results ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Val {
  Num(i64),
  Text(String),
}

// --- Common Step Creators ---
pub fn num_step(f: fn(i64) -> i64) -> ActionRef<i64, TestError> {
  action::map(move |x: i64| Ok(f(x)))
}

pub fn double() -> ActionRef<i64, TestError> {
  num_step(|x| x * 2)
}

pub fn incr() -> ActionRef<i64, TestError> {
  num_step(|x| x + 1)
}

pub fn halve() -> ActionRef<i64, TestError> {
  num_step(|x| x / 2)
}

/// Adds `amount` and bumps `counter` every time it runs.
pub fn counting_step(counter: Arc<AtomicUsize>, amount: i64) -> ActionRef<i64, TestError> {
  action::map(move |x: i64| {
    counter.fetch_add(1, Ordering::SeqCst);
    Ok(x + amount)
  })
}

/// Short-circuits with `payload` when the input is negative.
pub fn negative_guard(payload: i64) -> ActionRef<i64, TestError> {
  action::short_circuit_if(|x: &i64| *x < 0, move |_| payload)
}

pub fn failing_step(message: &'static str) -> ActionRef<i64, TestError> {
  action::from_fn(move |_x: i64| {
    tracing::warn!(target: "test_steps", "failing with: '{}'", message);
    Err(TestError::Step(message.to_string()))
  })
}

/// Appends `name` to a shared log. Its asynchronous form sleeps first, so a run that
/// did not wait for it before starting the next step would log out of order.
pub struct RecordingStep {
  pub name: &'static str,
  pub log: Arc<Mutex<Vec<&'static str>>>,
  pub delay: Duration,
}

impl RecordingStep {
  pub fn new(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>, delay: Duration) -> Arc<Self> {
    Arc::new(Self { name, log, delay })
  }
}

pub fn recording(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, delay: Duration) -> ActionRef<i64, TestError> {
  RecordingStep::new(name, log.clone(), delay)
}

#[async_trait]
impl Action<i64, TestError> for RecordingStep {
  fn execute(&self, input: i64) -> Result<PipelineControl<i64>, TestError> {
    self.log.lock().push(self.name);
    Ok(PipelineControl::Continue(input + 1))
  }

  async fn execute_async(&self, input: i64) -> Result<PipelineControl<i64>, TestError> {
    tokio::time::sleep(self.delay).await;
    self.log.lock().push(self.name);
    Ok(PipelineControl::Continue(input + 1))
  }
}

/// Wraps another executor and counts submissions.
pub struct CountingExecutor<X> {
  pub inner: X,
  pub submitted: AtomicUsize,
}

impl<X: Executor> CountingExecutor<X> {
  pub fn new(inner: X) -> Arc<Self> {
    Arc::new(Self {
      inner,
      submitted: AtomicUsize::new(0),
    })
  }

  pub fn count(&self) -> usize {
    self.submitted.load(Ordering::SeqCst)
  }
}

impl<X: Executor> Executor for CountingExecutor<X> {
  fn submit(&self, label: &str, task: Task) -> Completion {
    self.submitted.fetch_add(1, Ordering::SeqCst);
    self.inner.submit(label, task)
  }
}

/// Builds a pipeline from `(key, action)` pairs in order.
pub fn pipeline_of(steps: Vec<(&'static str, ActionRef<i64, TestError>)>) -> NumPipeline {
  let pipeline = NumPipeline::new();
  for (key, step) in steps {
    pipeline.put(key, step);
  }
  pipeline
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counter shared by tests that check how often steps ran ---
pub static STEP_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  STEP_EXEC_COUNTER.store(0, Ordering::SeqCst);
}
