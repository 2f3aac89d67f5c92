//! Partition schemes describing how a logical tensor is subdivided into fragments.

use super::nvector::NVector;
use super::scale::Scale;

/// Descriptor of one partition cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    pub size: Scale,
}

impl PartInfo {
    pub fn new(size: Scale) -> Self {
        PartInfo { size }
    }
}

/// Unpartitioned scheme: a single cell covering the whole tensor.
pub fn single(size: &Scale) -> NVector<PartInfo> {
    let grid = Scale::constant(size.num_dims(), 1);
    NVector::filled(grid, PartInfo::new(size.clone()))
}

/// Regular scheme splitting `size` into `num_parts` cells per axis.
pub fn even(size: &Scale, num_parts: &Scale) -> NVector<PartInfo> {
    size.equally_split(num_parts).map(|s| PartInfo::new(s.clone()))
}

/// Per-cell sizes of a partition scheme.
pub fn part_sizes(parts: &NVector<PartInfo>) -> NVector<Scale> {
    parts.map(|part| part.size.clone())
}

/// Location of a cell whose size breaks grid regularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrregularCell {
    pub coordinate: Scale,
    pub axis: usize,
}

/// Verifies that the size of every cell along each axis depends only on that axis' coordinate.
///
/// Offsets can only be propagated through grids that satisfy this; the first offending cell is
/// reported otherwise.
pub fn check_regular(sizes: &NVector<Scale>) -> Result<(), IrregularCell> {
    let num_dims = sizes.size().num_dims();
    for (pos, cell) in sizes.indexed() {
        if cell.num_dims() != num_dims {
            return Err(IrregularCell {
                coordinate: pos,
                axis: cell.num_dims().min(num_dims),
            });
        }
        for axis in 0..num_dims {
            let mut edge = Scale::origin(num_dims);
            edge[axis] = pos[axis];
            if sizes[&edge][axis] != cell[axis] {
                return Err(IrregularCell {
                    coordinate: pos,
                    axis,
                });
            }
        }
    }
    Ok(())
}
