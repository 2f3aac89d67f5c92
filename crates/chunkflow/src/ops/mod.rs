//! Chunks and the user-facing expansion functions that produce them.
//!
//! Expansion functions are the only extension point of the engine: it calls them, validates the
//! shape and count of what they return, and never inspects how they build physical nodes.
pub mod builtin;
mod chunk;
mod expand_fn;

pub use builtin::{ElementwiseFn, FillGen, RandnGen};
pub use chunk::Chunk;
pub use expand_fn::{FnCompute, FnDataGen, LogicalComputeFn, LogicalDataGenFn};
