// strand/src/pipeline/mutation.rs

//! Single-step structural mutators: put, remove, insert before/after/first, clear.
//!
//! Each one holds the pipeline's mutation lock for its whole body and publishes its
//! change to the node index in one write section, so a failed call never leaves a
//! partial change behind.

use crate::core::action::ActionRef;
use crate::core::link::Link;
use crate::error::StrandError;
use crate::pipeline::chain::Chain;
use crate::pipeline::definition::{Pipeline, PipelineKey};
use tracing::{event, Level};

impl<K, T, E> Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  /// Binds `action` to `key`.
  ///
  /// A new key is appended after the current last step. An existing key keeps its
  /// position and gets the new action; the action it replaced is returned.
  pub fn put(&self, key: K, action: ActionRef<T, E>) -> Option<ActionRef<T, E>> {
    let _guard = self.mutation.lock();
    let mut chain = self.chain.write();
    if chain.contains(&key) {
      event!(Level::DEBUG, pipeline = %self.name, key = ?key, "Step replaced in place.");
      return chain.replace(&key, action);
    }
    event!(Level::DEBUG, pipeline = %self.name, key = ?key, "Step appended.");
    chain.push_back(Link::new(key, action));
    None
  }

  /// Unlinks the step for `key` and returns its action. Absent keys are a no-op.
  pub fn remove(&self, key: &K) -> Option<ActionRef<T, E>> {
    let _guard = self.mutation.lock();
    let removed = self.chain.write().unlink(key);
    match &removed {
      Some(_) => event!(Level::DEBUG, pipeline = %self.name, key = ?key, "Step removed."),
      None => event!(Level::TRACE, pipeline = %self.name, key = ?key, "Remove of absent step ignored."),
    }
    removed.map(Link::into_body)
  }

  /// Splices a new step `new_key` immediately after the step `key`.
  pub fn insert_after(&self, key: &K, new_key: K, action: ActionRef<T, E>) -> Result<(), StrandError> {
    self.insert_one(key, new_key, action, true)
  }

  /// Splices a new step `new_key` immediately before the step `key`.
  pub fn insert_before(&self, key: &K, new_key: K, action: ActionRef<T, E>) -> Result<(), StrandError> {
    self.insert_one(key, new_key, action, false)
  }

  /// Makes `key` the first step. On an empty pipeline this is a plain `put`.
  pub fn insert_first(&self, key: K, action: ActionRef<T, E>) -> Result<(), StrandError> {
    let _guard = self.mutation.lock();
    let mut chain = self.chain.write();
    match chain.head().cloned() {
      None => {
        event!(Level::DEBUG, pipeline = %self.name, key = ?key, "Step appended to empty pipeline.");
        chain.push_back(Link::new(key, action));
        Ok(())
      }
      Some(head) => self.splice_locked(&mut chain, &head, key, action, false),
    }
  }

  /// Drops every step.
  pub fn clear(&self) {
    let _guard = self.mutation.lock();
    self.chain.write().clear();
    event!(Level::DEBUG, pipeline = %self.name, "Pipeline cleared.");
  }

  fn insert_one(&self, key: &K, new_key: K, action: ActionRef<T, E>, after: bool) -> Result<(), StrandError> {
    let _guard = self.mutation.lock();
    let mut chain = self.chain.write();
    self.splice_locked(&mut chain, key, new_key, action, after)
  }

  /// Validates and splices one link. Caller holds the mutation lock and the write guard.
  fn splice_locked(
    &self,
    chain: &mut Chain<K, T, E>,
    anchor: &K,
    new_key: K,
    action: ActionRef<T, E>,
    after: bool,
  ) -> Result<(), StrandError> {
    if chain.contains(&new_key) {
      event!(Level::ERROR, pipeline = %self.name, key = ?new_key, "Insert rejected: key already present.");
      return Err(StrandError::duplicate_key(&new_key));
    }
    if !chain.contains(anchor) {
      event!(Level::ERROR, pipeline = %self.name, anchor = ?anchor, "Insert rejected: anchor not found.");
      return Err(StrandError::key_not_found(anchor));
    }
    event!(
      Level::DEBUG,
      pipeline = %self.name,
      key = ?new_key,
      anchor = ?anchor,
      position = if after { "after" } else { "before" },
      "Step inserted."
    );
    chain.splice(anchor, vec![Link::new(new_key, action)], after)
  }
}
