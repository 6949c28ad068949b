// strand/src/pipeline/chain.rs

//! The arena behind a `Pipeline`: links indexed by key, plus head/tail and a
//! key -> predecessor-key index that stands in for back-pointers.
//!
//! Invariants, holding between any two calls:
//! 1. `head` is `None` iff `nodes` is empty; the link at `tail` has no successor.
//! 2. Walking `next` from `head` visits every key in `nodes` exactly once, ending at `tail`.
//! 3. `parents[k]` is the key whose link points at `k`, for every key but the head's;
//!    the head's key has no entry.
//! 4. Keys are unique.
//!
//! Every method either leaves the chain untouched or restores all four before returning.

use crate::core::action::ActionRef;
use crate::core::link::Link;
use crate::error::StrandError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub(crate) struct Chain<K, T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  head: Option<K>,
  tail: Option<K>,
  nodes: HashMap<K, Link<K, T, E>>,
  parents: HashMap<K, K>,
}

impl<K, T, E> Chain<K, T, E>
where
  K: Eq + Hash + Clone + Debug,
  T: Send + 'static,
  E: Send + 'static,
{
  pub(crate) fn new() -> Self {
    Self {
      head: None,
      tail: None,
      nodes: HashMap::new(),
      parents: HashMap::new(),
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.nodes.len()
  }

  pub(crate) fn contains(&self, key: &K) -> bool {
    self.nodes.contains_key(key)
  }

  pub(crate) fn head(&self) -> Option<&K> {
    self.head.as_ref()
  }

  pub(crate) fn tail(&self) -> Option<&K> {
    self.tail.as_ref()
  }

  pub(crate) fn body(&self, key: &K) -> Option<ActionRef<T, E>> {
    self.nodes.get(key).map(|link| link.body().clone())
  }

  /// Body and successor of `key`, as one consistent read.
  pub(crate) fn step(&self, key: &K) -> Option<(ActionRef<T, E>, Option<K>)> {
    self
      .nodes
      .get(key)
      .map(|link| (link.body().clone(), link.next().cloned()))
  }

  /// `Some(successor)` while `key` is linked, `None` once it is gone.
  pub(crate) fn successor(&self, key: &K) -> Option<Option<K>> {
    self.nodes.get(key).map(|link| link.next().cloned())
  }

  /// Keys in traversal order.
  pub(crate) fn keys(&self) -> Vec<K> {
    let mut keys = Vec::with_capacity(self.nodes.len());
    let mut cursor = self.head.as_ref();
    while let Some(key) = cursor {
      let Some(link) = self.nodes.get(key) else { break };
      keys.push(key.clone());
      cursor = link.next();
    }
    keys
  }

  /// Fresh, unlinked copies of every link, in traversal order.
  pub(crate) fn duplicate_links(&self) -> Vec<Link<K, T, E>> {
    let mut copies = Vec::with_capacity(self.nodes.len());
    let mut cursor = self.head.as_ref();
    while let Some(key) = cursor {
      let Some(link) = self.nodes.get(key) else { break };
      copies.push(link.duplicate());
      cursor = link.next();
    }
    copies
  }

  /// Appends `link` after the current tail. The key must not be present.
  pub(crate) fn push_back(&mut self, mut link: Link<K, T, E>) {
    link.detach();
    let key = link.key().clone();
    match self.tail.replace(key.clone()) {
      Some(previous_tail) => {
        if let Some(previous) = self.nodes.get_mut(&previous_tail) {
          previous.attach(key.clone());
        }
        self.parents.insert(key.clone(), previous_tail);
      }
      None => self.head = Some(key.clone()),
    }
    self.nodes.insert(key, link);
  }

  /// Swaps in a new link carrying `key` and `body` at the old link's position.
  /// Returns the previous body, or `None` if `key` is absent.
  pub(crate) fn replace(&mut self, key: &K, body: ActionRef<T, E>) -> Option<ActionRef<T, E>> {
    let slot = self.nodes.get_mut(key)?;
    let mut fresh = Link::new(key.clone(), body);
    if let Some(next) = slot.detach() {
      fresh.attach(next);
    }
    // The predecessor points at the key, not the link, so it needs no rewrite.
    Some(std::mem::replace(slot, fresh).into_body())
  }

  /// Removes the link for `key`, joining its predecessor to its successor.
  pub(crate) fn unlink(&mut self, key: &K) -> Option<Link<K, T, E>> {
    let mut link = self.nodes.remove(key)?;
    let next = link.detach();
    let parent = self.parents.remove(key);

    match &parent {
      Some(parent_key) => {
        if let Some(parent_link) = self.nodes.get_mut(parent_key) {
          parent_link.detach();
          if let Some(next_key) = &next {
            parent_link.attach(next_key.clone());
          }
        }
      }
      None => self.head = next.clone(),
    }

    match next {
      Some(next_key) => match parent {
        Some(parent_key) => {
          self.parents.insert(next_key, parent_key);
        }
        None => {
          self.parents.remove(&next_key);
        }
      },
      None => self.tail = parent,
    }
    Some(link)
  }

  /// Links `segment` together in the given order and splices it in right after (or
  /// right before) `anchor`.
  ///
  /// The caller guarantees that no key of `segment` is already present and that the
  /// segment's keys are distinct. Nothing is touched if `anchor` is absent.
  pub(crate) fn splice(&mut self, anchor: &K, segment: Vec<Link<K, T, E>>, after: bool) -> Result<(), StrandError> {
    if !self.nodes.contains_key(anchor) {
      return Err(StrandError::key_not_found(anchor));
    }
    let keys: Vec<K> = segment.iter().map(|link| link.key().clone()).collect();
    let (first, last) = match (keys.first(), keys.last()) {
      (Some(first), Some(last)) => (first.clone(), last.clone()),
      _ => return Ok(()),
    };

    for (idx, mut link) in segment.into_iter().enumerate() {
      link.detach();
      if let Some(next) = keys.get(idx + 1) {
        link.attach(next.clone());
      }
      if idx > 0 {
        self.parents.insert(keys[idx].clone(), keys[idx - 1].clone());
      }
      self.nodes.insert(keys[idx].clone(), link);
    }

    if after {
      let child = match self.nodes.get_mut(anchor) {
        Some(position) => {
          let child = position.detach();
          position.attach(first.clone());
          child
        }
        None => None,
      };
      self.parents.insert(first, anchor.clone());
      match child {
        Some(child) => {
          if let Some(end) = self.nodes.get_mut(&last) {
            end.attach(child.clone());
          }
          self.parents.insert(child, last);
        }
        None => self.tail = Some(last),
      }
    } else {
      let parent = self.parents.remove(anchor);
      if let Some(end) = self.nodes.get_mut(&last) {
        end.attach(anchor.clone());
      }
      self.parents.insert(anchor.clone(), last);
      match parent {
        Some(parent_key) => {
          if let Some(parent_link) = self.nodes.get_mut(&parent_key) {
            parent_link.detach();
            parent_link.attach(first.clone());
          }
          self.parents.insert(first, parent_key);
        }
        None => self.head = Some(first),
      }
    }
    Ok(())
  }

  pub(crate) fn clear(&mut self) {
    self.head = None;
    self.tail = None;
    self.parents.clear();
    self.nodes.clear();
  }

  /// Panics with a description of the first broken invariant.
  #[cfg(test)]
  pub(crate) fn assert_invariants(&self) {
    assert_eq!(self.head.is_none(), self.nodes.is_empty(), "head/emptiness mismatch");
    assert_eq!(self.tail.is_none(), self.nodes.is_empty(), "tail/emptiness mismatch");
    if let Some(head) = &self.head {
      assert!(!self.parents.contains_key(head), "head {:?} has a parent entry", head);
    }

    let mut visited = std::collections::HashSet::new();
    let mut previous: Option<&K> = None;
    let mut cursor = self.head.as_ref();
    while let Some(key) = cursor {
      assert!(visited.insert(key.clone()), "cycle at {:?}", key);
      let link = self.nodes.get(key).unwrap_or_else(|| panic!("dangling pointer to {:?}", key));
      if let Some(previous) = previous {
        assert_eq!(self.parents.get(key), Some(previous), "wrong parent for {:?}", key);
      }
      previous = Some(key);
      cursor = link.next();
    }
    assert_eq!(visited.len(), self.nodes.len(), "unreachable links");
    assert_eq!(previous, self.tail.as_ref(), "walk does not end at tail");
    assert_eq!(self.parents.len(), self.nodes.len().saturating_sub(1), "stale parent entries");
  }
}
