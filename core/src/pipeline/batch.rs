// strand/src/pipeline/batch.rs

//! Operations that copy a whole second pipeline's steps into this one.
//!
//! The source's links are always duplicated; the receiver never shares a link with
//! another pipeline. Both mutation locks are held while copying, taken in ascending
//! pipeline-id order so two pipelines spliced into each other concurrently cannot
//! deadlock.

use crate::error::StrandError;
use crate::pipeline::definition::{Pipeline, PipelineKey};
use parking_lot::MutexGuard;
use tracing::{event, Level};

impl<K, T, E> Pipeline<K, T, E>
where
  K: PipelineKey,
  T: Send + 'static,
  E: std::error::Error + From<StrandError> + Send + Sync + 'static,
{
  /// Appends every step of `other`, in its order, as if by sequential `put`.
  /// Keys already present here keep their position and take `other`'s action.
  pub fn put_all(&self, other: &Pipeline<K, T, E>) {
    if std::ptr::eq(self, other) {
      // Re-putting every step onto itself changes nothing.
      return;
    }
    let _guards = self.lock_pair(other);
    let copies = other.chain.read().duplicate_links();
    let count = copies.len();

    let mut chain = self.chain.write();
    for link in copies {
      let key = link.key().clone();
      if chain.contains(&key) {
        chain.replace(&key, link.into_body());
      } else {
        chain.push_back(link);
      }
    }
    event!(Level::DEBUG, pipeline = %self.name, source = %other.name, steps = count, "Steps put from another pipeline.");
  }

  /// Splices copies of all of `other`'s steps, in order, immediately after `key`.
  ///
  /// Fails without changing anything if `key` is absent or any of `other`'s keys
  /// already exists here.
  pub fn insert_pipeline_after(&self, key: &K, other: &Pipeline<K, T, E>) -> Result<(), StrandError> {
    self.splice_pipeline(key, other, true)
  }

  /// Splices copies of all of `other`'s steps, in order, immediately before `key`.
  pub fn insert_pipeline_before(&self, key: &K, other: &Pipeline<K, T, E>) -> Result<(), StrandError> {
    self.splice_pipeline(key, other, false)
  }

  fn splice_pipeline(&self, anchor: &K, other: &Pipeline<K, T, E>, after: bool) -> Result<(), StrandError> {
    let _guards = self.lock_pair(other);
    let segment = other.chain.read().duplicate_links();

    let mut chain = self.chain.write();
    if !chain.contains(anchor) {
      event!(Level::ERROR, pipeline = %self.name, anchor = ?anchor, "Splice rejected: anchor not found.");
      return Err(StrandError::key_not_found(anchor));
    }
    let collisions: Vec<String> = segment
      .iter()
      .filter(|link| chain.contains(link.key()))
      .map(|link| format!("{:?}", link.key()))
      .collect();
    if !collisions.is_empty() {
      event!(Level::ERROR, pipeline = %self.name, source = %other.name, collisions = ?collisions, "Splice rejected: key collision.");
      return Err(StrandError::KeyCollision { keys: collisions });
    }

    let count = segment.len();
    // Copies enter the index only here, after validation, in the same write section
    // that relinks the anchor.
    chain.splice(anchor, segment, after)?;
    event!(
      Level::DEBUG,
      pipeline = %self.name,
      source = %other.name,
      anchor = ?anchor,
      steps = count,
      position = if after { "after" } else { "before" },
      "Pipeline spliced."
    );
    Ok(())
  }

  /// Takes both mutation locks, lower pipeline id first. A pipeline paired with itself
  /// is locked once.
  fn lock_pair<'a>(&'a self, other: &'a Pipeline<K, T, E>) -> (MutexGuard<'a, ()>, Option<MutexGuard<'a, ()>>) {
    if std::ptr::eq(self, other) {
      return (self.mutation.lock(), None);
    }
    if self.id < other.id {
      let mine = self.mutation.lock();
      let theirs = other.mutation.lock();
      (mine, Some(theirs))
    } else {
      let theirs = other.mutation.lock();
      let mine = self.mutation.lock();
      (mine, Some(theirs))
    }
  }
}
