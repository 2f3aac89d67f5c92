//! Validation and placement of the fragments produced for one logical data node.

use crate::dag::{LogicalData, NodeId, PhysicalDag};
use crate::error::{ExpandError, ExpandResult};
use crate::ops::Chunk;
use crate::tensor::{partition, NVector, Scale};

use super::ExpandConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placement {
    node_id: NodeId,
    offset: Scale,
    offset_index: Scale,
}

/// Fragments of one logical node, validated and placed but not yet written to the physical graph.
#[derive(Debug, Clone)]
pub(super) struct PlannedMapping {
    node: NodeId,
    placements: NVector<Placement>,
}

impl PlannedMapping {
    /// Validates `chunks` against the declared size of `data` and computes every fragment's offset.
    ///
    /// Only the merged extent is compared with `data`; the chunk grid may differ from the declared
    /// partition grid. Generators are held to the declared grid by the engine before planning.
    /// Every chunk must name a data node of `pdag`. Nothing is mutated, so a failure leaves both
    /// the physical graph and the engine untouched.
    pub(super) fn plan(
        node: NodeId,
        data: &LogicalData,
        chunks: &NVector<Chunk>,
        pdag: &PhysicalDag,
        cfg: &ExpandConfig,
    ) -> ExpandResult<Self> {
        let grid = chunks.size();
        let num_dims = grid.num_dims();
        if num_dims != data.size.num_dims() {
            return Err(ExpandError::GridShapeMismatch {
                node,
                expected: data.partitions.size().clone(),
                actual: grid.clone(),
            });
        }
        if let Some(chunk) = chunks.iter().find(|c| c.size().num_dims() != num_dims) {
            return Err(ExpandError::ShapeMismatch {
                node,
                expected: data.size.clone(),
                actual: chunk.size().clone(),
            });
        }

        for chunk in chunks {
            pdag.data(chunk.node_id())?;
        }

        let sizes = chunks.map(|chunk| chunk.size().clone());
        let merged = Scale::merge(&sizes);
        if merged != data.size {
            return Err(ExpandError::ShapeMismatch {
                node,
                expected: data.size.clone(),
                actual: merged,
            });
        }
        if cfg.validate_regular_grid {
            partition::check_regular(&sizes).map_err(|cell| ExpandError::IrregularPartition {
                node,
                coordinate: cell.coordinate,
                axis: cell.axis,
            })?;
        }

        let offsets = propagate_offsets(&sizes);
        let placements = chunks
            .indexed()
            .zip(offsets.iter())
            .map(|((pos, chunk), offset)| Placement {
                node_id: chunk.node_id(),
                offset: offset.clone(),
                offset_index: pos,
            })
            .collect();
        Ok(PlannedMapping {
            node,
            placements: NVector::new(placements, grid.clone()),
        })
    }

    /// Writes offsets into the physical graph and returns the physical id of every grid cell.
    pub(super) fn apply(
        self,
        pdag: &PhysicalDag,
        cfg: &ExpandConfig,
    ) -> ExpandResult<NVector<NodeId>> {
        if cfg.trace_offsets {
            for placement in &self.placements {
                log::debug!(
                    "logical node {}: fragment {} at {} has offset {}",
                    self.node,
                    placement.node_id,
                    placement.offset_index,
                    placement.offset
                );
            }
        }
        pdag.set_placements(self.placements.iter().map(|placement| {
            (
                placement.node_id,
                placement.offset.clone(),
                placement.offset_index.clone(),
            )
        }))?;
        Ok(self.placements.map(|placement| placement.node_id))
    }
}

/// Computes the start of every cell in a grid of fragment sizes.
///
/// Walks the grid in enumeration order; along each axis a cell starts where its predecessor on
/// that axis ends, and any axis at coordinate 0 starts at 0.
fn propagate_offsets(sizes: &NVector<Scale>) -> NVector<Scale> {
    let grid = sizes.size();
    let num_dims = grid.num_dims();
    let mut offsets = NVector::filled(grid.clone(), Scale::origin(num_dims));
    if sizes.is_empty() {
        return offsets;
    }
    let mut pos = Scale::origin(num_dims);
    loop {
        let mut offset = Scale::origin(num_dims);
        for axis in 0..num_dims {
            if pos[axis] == 0 {
                continue;
            }
            let mut prev = pos.clone();
            prev[axis] -= 1;
            offset[axis] = offsets[&prev][axis] + sizes[&prev][axis];
        }
        offsets[&pos] = offset;
        if !Scale::incr_one(&mut pos, grid) {
            break;
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_of_uneven_regular_grid() {
        let sizes = Scale::new([5, 3]).equally_split(&Scale::new([2, 2]));
        let offsets = propagate_offsets(&sizes);
        assert_eq!(offsets[&Scale::new([0, 0])], Scale::new([0, 0]));
        assert_eq!(offsets[&Scale::new([1, 0])], Scale::new([3, 0]));
        assert_eq!(offsets[&Scale::new([0, 1])], Scale::new([0, 2]));
        assert_eq!(offsets[&Scale::new([1, 1])], Scale::new([3, 2]));
    }

    #[test]
    fn one_dimensional_offsets_accumulate() {
        let sizes = NVector::new(
            vec![Scale::new([1]), Scale::new([4]), Scale::new([2])],
            Scale::new([3]),
        );
        let offsets = propagate_offsets(&sizes);
        assert_eq!(
            offsets.into_vec(),
            vec![Scale::new([0]), Scale::new([1]), Scale::new([5])]
        );
    }
}
