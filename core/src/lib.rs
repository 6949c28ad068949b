// src/lib.rs

//! Strand: a mutable, key-addressable chain of composable actions.
//!
//! A `Pipeline<K, T, E>` is an ordered set of named steps that together behave as one
//! `T -> T` function:
//!  - Steps are addressed by key: append or replace in place with `put`, splice with
//!    `insert_before` / `insert_after` / `insert_first`, unlink with `remove`.
//!  - Whole pipelines can be copied into another one at an anchor key
//!    (`insert_pipeline_after` / `insert_pipeline_before`) or appended (`put_all`).
//!  - Execution is either a blocking fold (`execute` / `run`) or a chain of scheduled
//!    asynchronous units of work (`execute_async` / `run_async`).
//!  - Any step may end a run early with `PipelineControl::ShortCircuit(payload)`; the
//!    payload becomes the run's result. This is never reported as an error.
//!  - Pipelines are shared between threads with `Arc` and can be mutated while other
//!    threads read or execute them.
//!
//! ```
//! use strand::{action, Pipeline, PipelineControl, StrandError};
//!
//! let pipeline: Pipeline<&str, i64> = Pipeline::new();
//! pipeline.put("double", action::map(|x: i64| Ok::<_, StrandError>(x * 2)));
//! pipeline.put("incr", action::map(|x: i64| Ok::<_, StrandError>(x + 1)));
//! assert_eq!(pipeline.execute(3).unwrap(), 7);
//!
//! pipeline
//!   .insert_before(&"incr", "halve", action::map(|x: i64| Ok::<_, StrandError>(x / 2)))
//!   .unwrap();
//! assert_eq!(pipeline.keys(), vec!["double", "halve", "incr"]);
//! assert_eq!(pipeline.execute(4).unwrap(), 5);
//!
//! pipeline.insert_first(
//!   "guard",
//!   action::from_fn(|x: i64| {
//!     if x < 0 {
//!       Ok::<_, StrandError>(PipelineControl::ShortCircuit(0))
//!     } else {
//!       Ok(PipelineControl::Continue(x))
//!     }
//!   }),
//! ).unwrap();
//! assert_eq!(pipeline.execute(-5).unwrap(), 0);
//! ```

pub mod core;
pub mod error;
pub mod pipeline;

// --- Re-exports for the Public API ---

pub use crate::core::action::{self, Action, ActionRef};
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::executor::{
  schedule, BlockingExecutor, Completion, Executor, InlineExecutor, Task, TaskHandle, TokioExecutor,
};
pub use crate::core::link::Link;

pub use crate::pipeline::{Iter, Pipeline, PipelineBuilder, PipelineKey};

pub use crate::error::{StrandError, StrandResult};
