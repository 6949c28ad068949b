// strand/src/pipeline/definition.rs

//! Contains the `Pipeline<K, T, E>` struct definition, its construction, and the
//! read-only operations (lookup, membership, iteration).

use crate::core::action::ActionRef;
use crate::core::executor::{Executor, TokioExecutor};
use crate::error::StrandError;
use crate::pipeline::chain::Chain;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Bounds every step key has to satisfy. Implemented for all qualifying types.
pub trait PipelineKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<K> PipelineKey for K where K: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Source of pipeline identities. Two-pipeline operations lock the lower id first.
static NEXT_PIPELINE_ID: AtomicU64 = AtomicU64::new(1);

/// A mutable, key-addressable chain of actions that behaves as one `T -> T` function.
///
/// `K` names steps, `T` is the value folded through them, and `E` is the error type
/// step bodies fail with. `E` must be `From<StrandError>` so that failures the
/// pipeline itself runs into during an asynchronous run (e.g. a panicked step task)
/// can be reported through the same channel.
///
/// Every operation takes `&self`; share a pipeline between threads with `Arc`.
/// Structural mutators serialise on one mutation lock. Lookups, iteration and both
/// execution engines read the node index without that lock, so they observe
/// whatever state a concurrent mutator has published so far.
pub struct Pipeline<K, T, E = StrandError>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  pub(crate) id: u64,
  pub(crate) name: String,
  pub(crate) executor: Arc<dyn Executor>,
  /// Held for the full body of every structural mutator.
  pub(crate) mutation: Mutex<()>,
  pub(crate) chain: RwLock<Chain<K, T, E>>,
}

/// Configures a `Pipeline` before it is built.
#[derive(Default)]
pub struct PipelineBuilder {
  name: Option<String>,
  executor: Option<Arc<dyn Executor>>,
}

impl PipelineBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Name used in tracing spans and `Debug` output.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Default execution context for asynchronous runs. Steps that declare their own
  /// executor still use theirs.
  pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
    self.executor = Some(executor);
    self
  }

  pub fn build<K, T, E>(self) -> Pipeline<K, T, E>
  where
    K: PipelineKey,
    T: Send + 'static,
    E: std::error::Error + From<StrandError> + Send + Sync + 'static,
  {
    let id = NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed);
    Pipeline {
      id,
      name: self.name.unwrap_or_else(|| format!("pipeline-{}", id)),
      executor: self.executor.unwrap_or_else(|| Arc::new(TokioExecutor::current())),
      mutation: Mutex::new(()),
      chain: RwLock::new(Chain::new()),
    }
  }
}

impl<K, T, E> Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  /// Creates an empty pipeline running asynchronous steps on the ambient tokio runtime.
  pub fn new() -> Self {
    PipelineBuilder::new().build()
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The action bound to `key`, if any.
  pub fn get(&self, key: &K) -> Option<ActionRef<T, E>> {
    self.chain.read().body(key)
  }

  pub fn contains(&self, key: &K) -> bool {
    self.chain.read().contains(key)
  }

  pub fn len(&self) -> usize {
    self.chain.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn first_key(&self) -> Option<K> {
    self.chain.read().head().cloned()
  }

  pub fn last_key(&self) -> Option<K> {
    self.chain.read().tail().cloned()
  }

  /// Snapshot of the keys in traversal order.
  pub fn keys(&self) -> Vec<K> {
    self.chain.read().keys()
  }

  /// Walks the live chain one link at a time, yielding `(key, action)` pairs.
  ///
  /// This is not a snapshot: a mutation racing with an unfinished walk may or may not
  /// be observed by it. Each call starts again from the current head.
  pub fn iter(&self) -> Iter<'_, K, T, E> {
    Iter {
      pipeline: self,
      cursor: Cursor::Start,
    }
  }
}

impl<K, T, E> Default for Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<K, T, E> fmt::Debug for Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipeline")
      .field("name", &self.name)
      .field("steps", &self.keys())
      .finish()
  }
}

/// Forward, single-pass iterator over a pipeline's steps. See `Pipeline::iter`.
pub struct Iter<'a, K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  pipeline: &'a Pipeline<K, T, E>,
  cursor: Cursor<K>,
}

enum Cursor<K> {
  Start,
  /// The last key yielded and the successor it had when it was yielded.
  After { key: K, observed_next: Option<K> },
  Done,
}

impl<'a, K, T, E> Iterator for Iter<'a, K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  type Item = (K, ActionRef<T, E>);

  fn next(&mut self) -> Option<Self::Item> {
    let target = match std::mem::replace(&mut self.cursor, Cursor::Done) {
      Cursor::Start => self.pipeline.first_key(),
      Cursor::After { key, observed_next } => self.pipeline.advance(&key, observed_next),
      Cursor::Done => None,
    }?;
    let (body, observed_next) = self.pipeline.chain.read().step(&target)?;
    self.cursor = Cursor::After {
      key: target.clone(),
      observed_next,
    };
    Some((target, body))
  }
}

impl<'a, K, T, E> IntoIterator for &'a Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  type Item = (K, ActionRef<T, E>);
  type IntoIter = Iter<'a, K, T, E>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}
