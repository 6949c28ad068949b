// tests/pipeline_structure_tests.rs
mod common;

use common::*;
use std::sync::Arc;
use strand::{PipelineBuilder, StrandError};

#[test]
fn test_put_appends_in_insertion_order() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr()), ("c", halve())]);

  assert_eq!(pipeline.keys(), vec!["a", "b", "c"]);
  assert_eq!(pipeline.len(), 3);
  assert!(!pipeline.is_empty());
  assert_eq!(pipeline.first_key(), Some("a"));
  assert_eq!(pipeline.last_key(), Some("c"));
  assert!(pipeline.contains(&"b"));
  assert!(!pipeline.contains(&"z"));
}

#[test]
fn test_get_returns_bound_action() {
  setup_tracing();
  let step = double();
  let pipeline = pipeline_of(vec![("a", step.clone())]);

  let bound = pipeline.get(&"a").expect("step a should be bound");
  assert!(Arc::ptr_eq(&bound, &step));
  assert!(pipeline.get(&"missing").is_none());
}

#[test]
fn test_put_existing_key_replaces_in_place() {
  setup_tracing();
  let original = incr();
  let pipeline = pipeline_of(vec![("a", double()), ("b", original.clone()), ("c", halve())]);

  let previous = pipeline.put("b", num_step(|x| x + 100));

  assert!(Arc::ptr_eq(&previous.expect("b was bound"), &original));
  assert_eq!(pipeline.keys(), vec!["a", "b", "c"]);
  assert_eq!(pipeline.len(), 3);
  // 5*2=10 -> +100=110 -> /2=55
  assert_eq!(pipeline.execute(5).unwrap(), 55);
}

#[test]
fn test_put_existing_head_and_tail_keeps_order() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr())]);

  assert!(pipeline.put("a", incr()).is_some());
  assert!(pipeline.put("b", double()).is_some());

  assert_eq!(pipeline.keys(), vec!["a", "b"]);
  assert_eq!(pipeline.execute(1).unwrap(), 4); // (1+1)*2
}

#[test]
fn test_remove_unlinks_head_middle_and_tail() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr()), ("c", halve()), ("d", incr())]);

  assert!(pipeline.remove(&"b").is_some());
  assert_eq!(pipeline.keys(), vec!["a", "c", "d"]);
  assert!(!pipeline.contains(&"b"));

  assert!(pipeline.remove(&"a").is_some());
  assert_eq!(pipeline.keys(), vec!["c", "d"]);
  assert_eq!(pipeline.first_key(), Some("c"));

  assert!(pipeline.remove(&"d").is_some());
  assert_eq!(pipeline.keys(), vec!["c"]);
  assert_eq!(pipeline.last_key(), Some("c"));

  assert!(pipeline.remove(&"c").is_some());
  assert!(pipeline.is_empty());
  assert_eq!(pipeline.first_key(), None);
  assert_eq!(pipeline.last_key(), None);

  // The emptied pipeline is fully usable again.
  pipeline.put("e", incr());
  assert_eq!(pipeline.keys(), vec!["e"]);
  assert_eq!(pipeline.execute(1).unwrap(), 2);
}

#[test]
fn test_remove_returns_removed_action() {
  setup_tracing();
  let step = halve();
  let pipeline = pipeline_of(vec![("a", double()), ("b", step.clone())]);

  let removed = pipeline.remove(&"b").expect("b was bound");
  assert!(Arc::ptr_eq(&removed, &step));
}

#[test]
fn test_remove_absent_key_is_noop() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr())]);

  assert!(pipeline.remove(&"zzz").is_none());
  assert_eq!(pipeline.keys(), vec!["a", "b"]);
  assert_eq!(pipeline.len(), 2);
}

#[test]
fn test_insert_after_places_key_immediately_after() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr())]);

  pipeline.insert_after(&"a", "x", halve()).unwrap();
  assert_eq!(pipeline.keys(), vec!["a", "x", "b"]);

  pipeline.insert_after(&"b", "y", halve()).unwrap();
  assert_eq!(pipeline.keys(), vec!["a", "x", "b", "y"]);
  assert_eq!(pipeline.last_key(), Some("y"));
}

#[test]
fn test_insert_before_places_key_immediately_before() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr())]);

  pipeline.insert_before(&"b", "x", halve()).unwrap();
  assert_eq!(pipeline.keys(), vec!["a", "x", "b"]);

  pipeline.insert_before(&"a", "y", halve()).unwrap();
  assert_eq!(pipeline.keys(), vec!["y", "a", "x", "b"]);
  assert_eq!(pipeline.first_key(), Some("y"));
}

#[test]
fn test_insert_with_existing_key_fails_and_leaves_pipeline_unchanged() {
  setup_tracing();
  let b_step = incr();
  let pipeline = pipeline_of(vec![("a", double()), ("b", b_step.clone()), ("c", halve())]);
  let before = pipeline.keys();

  let err = pipeline.insert_after(&"a", "b", halve()).unwrap_err();
  assert!(matches!(err, StrandError::DuplicateKey { ref key } if key.contains('b')));
  assert!(err.is_structural());

  let err = pipeline.insert_before(&"c", "a", halve()).unwrap_err();
  assert!(matches!(err, StrandError::DuplicateKey { .. }));

  // Inserting a key next to itself is also a duplicate.
  let err = pipeline.insert_after(&"c", "c", halve()).unwrap_err();
  assert!(matches!(err, StrandError::DuplicateKey { .. }));

  assert_eq!(pipeline.keys(), before);
  assert!(Arc::ptr_eq(&pipeline.get(&"b").unwrap(), &b_step));
  assert_eq!(pipeline.execute(3).unwrap(), 3); // 3*2=6 -> 7 -> 3
}

#[test]
fn test_insert_at_missing_anchor_fails_and_leaves_pipeline_unchanged() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double())]);

  let err = pipeline.insert_after(&"nope", "x", incr()).unwrap_err();
  assert!(matches!(err, StrandError::KeyNotFound { ref key } if key.contains("nope")));
  let err = pipeline.insert_before(&"nope", "x", incr()).unwrap_err();
  assert!(matches!(err, StrandError::KeyNotFound { .. }));

  assert_eq!(pipeline.keys(), vec!["a"]);
  assert!(!pipeline.contains(&"x"));
}

#[test]
fn test_insert_first_on_empty_and_populated_pipeline() {
  setup_tracing();
  let pipeline = NumPipeline::new();

  pipeline.insert_first("b", incr()).unwrap();
  assert_eq!(pipeline.keys(), vec!["b"]);

  pipeline.insert_first("a", double()).unwrap();
  assert_eq!(pipeline.keys(), vec!["a", "b"]);
  assert_eq!(pipeline.execute(3).unwrap(), 7);

  let err = pipeline.insert_first("b", halve()).unwrap_err();
  assert!(matches!(err, StrandError::DuplicateKey { .. }));
  assert_eq!(pipeline.keys(), vec!["a", "b"]);
}

#[test]
fn test_clear_discards_everything() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr())]);

  pipeline.clear();

  assert!(pipeline.is_empty());
  assert!(pipeline.keys().is_empty());
  assert!(pipeline.get(&"a").is_none());
  assert_eq!(pipeline.execute(9).unwrap(), 9);

  pipeline.put("a", incr());
  assert_eq!(pipeline.keys(), vec!["a"]);
}

#[test]
fn test_iteration_is_ordered_and_restartable() {
  setup_tracing();
  let a_step = double();
  let pipeline = pipeline_of(vec![("a", a_step.clone()), ("b", incr()), ("c", halve())]);

  let first_pass: Vec<_> = pipeline.iter().map(|(key, _)| key).collect();
  let second_pass: Vec<_> = (&pipeline).into_iter().map(|(key, _)| key).collect();
  assert_eq!(first_pass, vec!["a", "b", "c"]);
  assert_eq!(first_pass, second_pass);

  let (key, body) = pipeline.iter().next().unwrap();
  assert_eq!(key, "a");
  assert!(Arc::ptr_eq(&body, &a_step));

  let mut visited = Vec::new();
  for (key, _) in &pipeline {
    visited.push(key);
  }
  assert_eq!(visited, vec!["a", "b", "c"]);
}

#[test]
fn test_iteration_reflects_live_chain() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr()), ("c", halve())]);

  let mut iter = pipeline.iter();
  assert_eq!(iter.next().map(|(key, _)| key), Some("a"));
  // Mutating ahead of the cursor is visible to the walk in progress.
  pipeline.remove(&"b");
  pipeline.insert_after(&"a", "x", incr()).unwrap();
  let rest: Vec<_> = iter.map(|(key, _)| key).collect();
  assert_eq!(rest, vec!["x", "c"]);
}

#[test]
fn test_iteration_continues_after_yielded_step_is_removed() {
  setup_tracing();
  let pipeline = pipeline_of(vec![("a", double()), ("b", incr()), ("c", halve())]);

  let mut iter = pipeline.iter();
  assert_eq!(iter.next().map(|(key, _)| key), Some("a"));
  // The step just yielded disappears; the walk resumes at the successor it had.
  pipeline.remove(&"a");
  let rest: Vec<_> = iter.map(|(key, _)| key).collect();
  assert_eq!(rest, vec!["b", "c"]);

  let mut iter = pipeline.iter();
  assert_eq!(iter.next().map(|(key, _)| key), Some("b"));
  // A step appended behind the cursor is still reached.
  pipeline.remove(&"c");
  pipeline.put("d", incr());
  let rest: Vec<_> = iter.map(|(key, _)| key).collect();
  assert_eq!(rest, vec!["d"]);
}

#[test]
fn test_builder_name_and_debug_output() {
  setup_tracing();
  let pipeline: NumPipeline = PipelineBuilder::new().name("checkout").build();
  pipeline.put("validate", incr());
  pipeline.put("charge", double());

  assert_eq!(pipeline.name(), "checkout");
  let rendered = format!("{:?}", pipeline);
  assert!(rendered.contains("checkout"));
  assert!(rendered.contains("\"validate\", \"charge\""));

  let unnamed = NumPipeline::default();
  assert!(unnamed.name().starts_with("pipeline-"));
}
