//! Extension points invoked by the expansion engine.

use std::fmt;

use anyhow::Result;

use crate::dag::PhysicalDag;
use crate::tensor::{NVector, Scale};

use super::Chunk;

/// Produces the fragments of a logical data node that is not the output of an operation.
pub trait LogicalDataGenFn: Send + Sync {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> String;

    /// Creates and registers one physical data node per requested partition and returns chunks
    /// laid out like `part_sizes`.
    fn expand(&self, pdag: &PhysicalDag, part_sizes: &NVector<Scale>) -> Result<NVector<Chunk>>;
}

/// Expands a logical operation over already-expanded input fragments.
pub trait LogicalComputeFn: Send + Sync {
    fn name(&self) -> String;

    /// Receives one chunk grid per logical input and returns one chunk grid per logical output,
    /// registering the physical operations and output fragments it creates.
    fn expand(&self, pdag: &PhysicalDag, inputs: &[NVector<Chunk>]) -> Result<Vec<NVector<Chunk>>>;
}

type DataGenClosure = dyn Fn(&PhysicalDag, &NVector<Scale>) -> Result<NVector<Chunk>> + Send + Sync;
type ComputeClosure =
    dyn Fn(&PhysicalDag, &[NVector<Chunk>]) -> Result<Vec<NVector<Chunk>>> + Send + Sync;

/// Data-generation function backed by a closure.
pub struct FnDataGen {
    name: String,
    f: Box<DataGenClosure>,
}

impl FnDataGen {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&PhysicalDag, &NVector<Scale>) -> Result<NVector<Chunk>> + Send + Sync + 'static,
    {
        FnDataGen {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl LogicalDataGenFn for FnDataGen {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn expand(&self, pdag: &PhysicalDag, part_sizes: &NVector<Scale>) -> Result<NVector<Chunk>> {
        (self.f)(pdag, part_sizes)
    }
}

impl fmt::Debug for FnDataGen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDataGen").field("name", &self.name).finish()
    }
}

/// Compute function backed by a closure.
pub struct FnCompute {
    name: String,
    f: Box<ComputeClosure>,
}

impl FnCompute {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&PhysicalDag, &[NVector<Chunk>]) -> Result<Vec<NVector<Chunk>>>
            + Send
            + Sync
            + 'static,
    {
        FnCompute {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl LogicalComputeFn for FnCompute {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn expand(&self, pdag: &PhysicalDag, inputs: &[NVector<Chunk>]) -> Result<Vec<NVector<Chunk>>> {
        (self.f)(pdag, inputs)
    }
}

impl fmt::Debug for FnCompute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCompute").field("name", &self.name).finish()
    }
}
