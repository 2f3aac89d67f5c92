//! Multi-dimensional extents and coordinates.
//!
//! A [`Scale`] doubles as the size of a tensor, the coordinate of a fragment inside a partition
//! grid, and the offset of a fragment inside its parent tensor. Combining two scales of different
//! dimensionality is a programming error and panics.

use std::fmt;
use std::ops::{Add, Index, IndexMut, Sub};

use smallvec::SmallVec;

use super::nvector::NVector;

/// Inline storage for scale components; most tensors have at most four axes.
pub type Dims = SmallVec<[usize; 4]>;

/// Ordered tuple of non-negative integers, one per tensor dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Scale {
    dims: Dims,
}

impl Scale {
    /// Builds a scale from any sequence of components.
    pub fn new<I>(dims: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        Scale {
            dims: dims.into_iter().collect(),
        }
    }

    /// The all-zero scale with `num_dims` axes.
    pub fn origin(num_dims: usize) -> Self {
        Self::constant(num_dims, 0)
    }

    /// A scale with every component set to `value`.
    pub fn constant(num_dims: usize, value: usize) -> Self {
        Scale {
            dims: SmallVec::from_elem(value, num_dims),
        }
    }

    pub fn num_dims(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of elements covered by this extent (empty product is 1).
    pub fn prod(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn map<F>(&self, f: F) -> Scale
    where
        F: FnMut(usize) -> usize,
    {
        Scale {
            dims: self.dims.iter().copied().map(f).collect(),
        }
    }

    /// Element-wise maximum of two scales.
    pub fn max(&self, other: &Scale) -> Scale {
        self.zip_with(other, "max", usize::max)
    }

    /// Element-wise `max(x - 1, 0)`: the coordinate one step back along every axis, floored at 0.
    pub fn decrement_floor(&self) -> Scale {
        self.map(|x| x.saturating_sub(1))
    }

    /// Panics unless `other` has the same dimensionality as `self`.
    pub fn assert_same_dims(&self, other: &Scale, op: &str) {
        assert_eq!(
            self.num_dims(),
            other.num_dims(),
            "{op}: dimensionality mismatch between {self} and {other}"
        );
    }

    fn zip_with<F>(&self, other: &Scale, op: &str, mut f: F) -> Scale
    where
        F: FnMut(usize, usize) -> usize,
    {
        self.assert_same_dims(other, op);
        Scale {
            dims: self
                .dims
                .iter()
                .zip(other.dims.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Advances `pos` to the next coordinate of the grid `[0, bound)`, axis 0 fastest.
    ///
    /// Lower axes wrap to 0 and carry into higher axes. Returns `false` once `pos` was the final
    /// coordinate, in which case `pos` wraps back to the origin. Callers process the current
    /// coordinate before advancing, so a grid with a single cell is still visited once:
    ///
    /// ```
    /// use chunkflow::tensor::Scale;
    ///
    /// let bound = Scale::new([2, 3]);
    /// let mut pos = Scale::origin(2);
    /// let mut visited = 0;
    /// loop {
    ///     visited += 1;
    ///     if !Scale::incr_one(&mut pos, &bound) {
    ///         break;
    ///     }
    /// }
    /// assert_eq!(visited, 6);
    /// ```
    pub fn incr_one(pos: &mut Scale, bound: &Scale) -> bool {
        pos.assert_same_dims(bound, "incr_one");
        for axis in 0..pos.num_dims() {
            if pos.dims[axis] + 1 < bound.dims[axis] {
                pos.dims[axis] += 1;
                return true;
            }
            pos.dims[axis] = 0;
        }
        false
    }

    /// Iterates every coordinate of the grid `[0, bound)` in [`Scale::incr_one`] order.
    pub fn range(bound: &Scale) -> ScaleRange {
        ScaleRange::new(bound.clone())
    }

    /// Reconstructs the extent of a whole tensor from the grid of its partition sizes.
    ///
    /// Along each axis the sizes of the cells reached by varying only that axis (every other
    /// coordinate held at 0) are summed. An empty grid merges to the origin.
    pub fn merge(parts: &NVector<Scale>) -> Scale {
        let grid = parts.size();
        let num_dims = grid.num_dims();
        if parts.is_empty() {
            return Scale::origin(num_dims);
        }
        let mut merged = Scale::origin(parts[&Scale::origin(num_dims)].num_dims());
        assert_eq!(
            merged.num_dims(),
            num_dims,
            "merge: partition sizes have {} dims but the grid has {}",
            merged.num_dims(),
            num_dims
        );
        for axis in 0..num_dims {
            let mut pos = Scale::origin(num_dims);
            for index in 0..grid[axis] {
                pos[axis] = index;
                merged[axis] += parts[&pos][axis];
            }
        }
        merged
    }

    /// Splits this extent into a regular grid of `num_parts` cells.
    ///
    /// When an axis does not divide evenly the leading parts along it take one extra element.
    pub fn equally_split(&self, num_parts: &Scale) -> NVector<Scale> {
        self.assert_same_dims(num_parts, "equally_split");
        assert!(
            num_parts.dims.iter().all(|&n| n > 0),
            "equally_split: cannot split {self} into {num_parts} parts"
        );
        NVector::from_fn(num_parts.clone(), |pos| {
            Scale::new((0..self.num_dims()).map(|axis| {
                let base = self[axis] / num_parts[axis];
                let rem = self[axis] % num_parts[axis];
                base + usize::from(pos[axis] < rem)
            }))
        })
    }
}

impl From<Vec<usize>> for Scale {
    fn from(dims: Vec<usize>) -> Self {
        Scale::new(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Scale {
    fn from(dims: [usize; N]) -> Self {
        Scale::new(dims)
    }
}

impl Index<usize> for Scale {
    type Output = usize;

    fn index(&self, axis: usize) -> &usize {
        &self.dims[axis]
    }
}

impl IndexMut<usize> for Scale {
    fn index_mut(&mut self, axis: usize) -> &mut usize {
        &mut self.dims[axis]
    }
}

impl Add<&Scale> for &Scale {
    type Output = Scale;

    fn add(self, rhs: &Scale) -> Scale {
        self.zip_with(rhs, "add", |a, b| a + b)
    }
}

impl Add for Scale {
    type Output = Scale;

    fn add(self, rhs: Scale) -> Scale {
        &self + &rhs
    }
}

impl Sub<&Scale> for &Scale {
    type Output = Scale;

    /// Panics if any component of `rhs` exceeds the matching component of `self`.
    fn sub(self, rhs: &Scale) -> Scale {
        self.zip_with(rhs, "sub", |a, b| {
            a.checked_sub(b)
                .unwrap_or_else(|| panic!("sub: component underflow ({a} - {b})"))
        })
    }
}

impl Sub for Scale {
    type Output = Scale;

    fn sub(self, rhs: Scale) -> Scale {
        &self - &rhs
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, dim) in self.dims.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]")
    }
}

/// Iterator over every coordinate of a grid, produced by [`Scale::range`].
#[derive(Debug, Clone)]
pub struct ScaleRange {
    bound: Scale,
    next: Option<Scale>,
}

impl ScaleRange {
    fn new(bound: Scale) -> Self {
        let next = (bound.prod() > 0).then(|| Scale::origin(bound.num_dims()));
        ScaleRange { bound, next }
    }
}

impl Iterator for ScaleRange {
    type Item = Scale;

    fn next(&mut self) -> Option<Scale> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        if Scale::incr_one(&mut advanced, &self.bound) {
            self.next = Some(advanced);
        }
        Some(current)
    }
}
