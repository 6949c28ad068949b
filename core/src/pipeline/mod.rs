// strand/src/pipeline/mod.rs

//! Defines the `Pipeline<K, T, E>` struct, its structural mutators, batch composition
//! and the two execution engines.

mod chain;
pub mod batch;
pub mod definition;
pub mod execution;
pub mod mutation;

// Re-export the main Pipeline struct
pub use definition::{Iter, Pipeline, PipelineBuilder, PipelineKey};
