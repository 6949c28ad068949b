pub mod action;
pub mod control;
pub mod executor;
pub mod link;

// Re-export key types for easier access from other strand modules (and lib.rs)
pub use action::{Action, ActionRef};
pub use control::{PipelineControl, PipelineResult};
pub use executor::{BlockingExecutor, Executor, InlineExecutor, TaskHandle, TokioExecutor};
pub use link::Link;
