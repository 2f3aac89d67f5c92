//! Expansion of partition-agnostic logical dataflow graphs into partitioned physical graphs.
//!
//! A [`LogicalDag`] describes tensors, how each is to be partitioned, and the operations between
//! them. [`ExpandEngine`] turns requested logical nodes into physical fragments ("chunks") by
//! invoking user-supplied [`LogicalDataGenFn`] and [`LogicalComputeFn`] implementations, checks
//! that the fragments reassemble the declared tensor size, and places each fragment at its offset
//! inside the parent tensor.

pub mod dag;
pub mod error;
pub mod expand;
pub mod ops;
pub mod tensor;

pub use dag::{LogicalDag, LogicalData, NodeId, PhysicalDag, PhysicalData};
pub use error::{ExpandError, ExpandResult};
pub use expand::{ExpandConfig, ExpandEngine, ExpandStats};
pub use ops::{Chunk, LogicalComputeFn, LogicalDataGenFn};
pub use tensor::{NVector, PartInfo, Scale};
