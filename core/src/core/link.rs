// strand/src/core/link.rs

//! Defines `Link`, one element of a pipeline's chain.
//!
//! Links live in an arena keyed by their own key, so the forward pointer is the
//! successor's key rather than a reference. There is no back-pointer; the pipeline
//! keeps a separate predecessor index for that.

use crate::core::action::ActionRef;
use std::fmt;

pub struct Link<K, T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  key: K,
  body: ActionRef<T, E>,
  next: Option<K>,
}

impl<K: Clone, T: Send + 'static, E: Send + 'static> Link<K, T, E> {
  /// Creates an unlinked link.
  pub fn new(key: K, body: ActionRef<T, E>) -> Self {
    Self { key, body, next: None }
  }

  pub fn key(&self) -> &K {
    &self.key
  }

  pub fn body(&self) -> &ActionRef<T, E> {
    &self.body
  }

  pub fn next(&self) -> Option<&K> {
    self.next.as_ref()
  }

  /// Points this link at `next`.
  ///
  /// Attaching over a live successor without detaching it first leaves that successor
  /// unreachable from here.
  pub fn attach(&mut self, next: K) {
    self.next = Some(next);
  }

  /// Clears the forward pointer and returns the previous successor.
  pub fn detach(&mut self) -> Option<K> {
    self.next.take()
  }

  /// A fresh, unlinked link with the same key and body.
  pub fn duplicate(&self) -> Self {
    Self::new(self.key.clone(), self.body.clone())
  }

  pub(crate) fn into_body(self) -> ActionRef<T, E> {
    self.body
  }
}

impl<K: fmt::Debug, T: Send + 'static, E: Send + 'static> fmt::Debug for Link<K, T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Link")
      .field("key", &self.key)
      .field("next", &self.next)
      .finish()
  }
}
