//! Stock expansion functions.
//!
//! Generators create one fragment per partition together with a source operation that fills it.
//! [`ElementwiseFn`] expands an n-ary element-wise operator cell by cell, so its inputs must share
//! a partition grid.

use anyhow::{bail, ensure, Result};

use crate::dag::{PhysicalDag, PhysicalData, PhysicalOp};
use crate::tensor::{NVector, Scale};

use super::{Chunk, LogicalComputeFn, LogicalDataGenFn};

fn generate(pdag: &PhysicalDag, part_sizes: &NVector<Scale>, name: &str) -> Result<NVector<Chunk>> {
    part_sizes.try_map(|size| -> Result<Chunk> {
        let chunk = pdag.new_chunk(PhysicalData::new(size.clone()).with_origin(name));
        pdag.new_op_node(PhysicalOp::new(name), &[], &[chunk.node_id()])?;
        Ok(chunk)
    })
}

/// Fills every fragment with a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillGen {
    pub value: f32,
}

impl FillGen {
    pub fn new(value: f32) -> Self {
        FillGen { value }
    }

    pub fn zeros() -> Self {
        Self::new(0.0)
    }
}

impl LogicalDataGenFn for FillGen {
    fn name(&self) -> String {
        format!("fill({})", self.value)
    }

    fn expand(&self, pdag: &PhysicalDag, part_sizes: &NVector<Scale>) -> Result<NVector<Chunk>> {
        generate(pdag, part_sizes, &self.name())
    }
}

/// Fills every fragment with normally distributed values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandnGen {
    pub mean: f32,
    pub std: f32,
}

impl RandnGen {
    pub fn new(mean: f32, std: f32) -> Self {
        RandnGen { mean, std }
    }
}

impl LogicalDataGenFn for RandnGen {
    fn name(&self) -> String {
        format!("randn({}, {})", self.mean, self.std)
    }

    fn expand(&self, pdag: &PhysicalDag, part_sizes: &NVector<Scale>) -> Result<NVector<Chunk>> {
        ensure!(self.std >= 0.0, "randn: negative standard deviation {}", self.std);
        generate(pdag, part_sizes, &self.name())
    }
}

/// Element-wise operator applied independently to every partition cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementwiseFn {
    op: String,
    num_outputs: usize,
}

impl ElementwiseFn {
    pub fn new(op: impl Into<String>) -> Self {
        ElementwiseFn {
            op: op.into(),
            num_outputs: 1,
        }
    }

    /// Operator producing `num_outputs` results per cell, each shaped like the inputs.
    pub fn with_outputs(mut self, num_outputs: usize) -> Self {
        self.num_outputs = num_outputs;
        self
    }
}

impl LogicalComputeFn for ElementwiseFn {
    fn name(&self) -> String {
        format!("elewise.{}", self.op)
    }

    fn expand(&self, pdag: &PhysicalDag, inputs: &[NVector<Chunk>]) -> Result<Vec<NVector<Chunk>>> {
        let Some(first) = inputs.first() else {
            bail!("{}: element-wise operators need at least one input", self.name());
        };
        let grid = first.size().clone();
        for (idx, input) in inputs.iter().enumerate().skip(1) {
            ensure!(
                input.size() == &grid,
                "{}: input {idx} is partitioned as {} but input 0 as {grid}",
                self.name(),
                input.size()
            );
        }

        let name = self.name();
        let mut outputs: Vec<Vec<Chunk>> = vec![Vec::with_capacity(first.len()); self.num_outputs];
        for (pos, chunk) in first.indexed() {
            let mut operands = Vec::with_capacity(inputs.len());
            for (idx, input) in inputs.iter().enumerate() {
                let operand = &input[&pos];
                ensure!(
                    operand.size() == chunk.size(),
                    "{name}: input {idx} has size {} at {pos}, expected {}",
                    operand.size(),
                    chunk.size()
                );
                operands.push(operand.node_id());
            }
            let results: Vec<Chunk> = (0..self.num_outputs)
                .map(|_| pdag.new_chunk(PhysicalData::new(chunk.size().clone()).with_origin(&name)))
                .collect();
            let result_ids: Vec<_> = results.iter().map(Chunk::node_id).collect();
            pdag.new_op_node(PhysicalOp::new(&name), &operands, &result_ids)?;
            for (output, result) in outputs.iter_mut().zip(results) {
                output.push(result);
            }
        }

        Ok(outputs
            .into_iter()
            .map(|chunks| NVector::new(chunks, grid.clone()))
            .collect())
    }
}
