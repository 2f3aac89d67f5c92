//! Dense N-dimensional containers indexed by [`Scale`].

use std::ops::{Index, IndexMut};

use super::scale::{Scale, ScaleRange};

/// Rectangular grid of values. Elements are stored axis-0-fastest so that linear order matches
/// the enumeration order of [`Scale::incr_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NVector<T> {
    data: Vec<T>,
    size: Scale,
}

impl<T> NVector<T> {
    /// Wraps `data` as a grid of extent `size`.
    ///
    /// Panics if `data.len()` differs from the number of cells implied by `size`.
    pub fn new(data: Vec<T>, size: Scale) -> Self {
        assert_eq!(
            data.len(),
            size.prod(),
            "nvector data length ({}) does not match extent {}",
            data.len(),
            size
        );
        NVector { data, size }
    }

    /// Builds a grid by evaluating `f` at every coordinate.
    pub fn from_fn<F>(size: Scale, mut f: F) -> Self
    where
        F: FnMut(&Scale) -> T,
    {
        let data = Scale::range(&size).map(|pos| f(&pos)).collect();
        NVector { data, size }
    }

    pub fn filled(size: Scale, value: T) -> Self
    where
        T: Clone,
    {
        let data = vec![value; size.prod()];
        NVector { data, size }
    }

    /// Extent of the grid.
    pub fn size(&self) -> &Scale {
        &self.size
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, pos: &Scale) -> Option<&T> {
        self.linear_index(pos).map(|idx| &self.data[idx])
    }

    pub fn get_mut(&mut self, pos: &Scale) -> Option<&mut T> {
        self.linear_index(pos).map(|idx| &mut self.data[idx])
    }

    /// Elements in enumeration order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Elements paired with their coordinates, in enumeration order.
    pub fn indexed(&self) -> impl Iterator<Item = (Scale, &T)> {
        Scale::range(&self.size).zip(self.data.iter())
    }

    /// Coordinates of every cell in enumeration order.
    pub fn positions(&self) -> ScaleRange {
        Scale::range(&self.size)
    }

    /// Order-preserving element-wise transform.
    pub fn map<U, F>(&self, f: F) -> NVector<U>
    where
        F: FnMut(&T) -> U,
    {
        NVector {
            data: self.data.iter().map(f).collect(),
            size: self.size.clone(),
        }
    }

    /// Fallible element-wise transform; stops at the first error.
    pub fn try_map<U, E, F>(&self, f: F) -> Result<NVector<U>, E>
    where
        F: FnMut(&T) -> Result<U, E>,
    {
        let data = self.data.iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(NVector {
            data,
            size: self.size.clone(),
        })
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn linear_index(&self, pos: &Scale) -> Option<usize> {
        if pos.num_dims() != self.size.num_dims() {
            return None;
        }
        let mut index = 0;
        let mut stride = 1;
        for axis in 0..pos.num_dims() {
            if pos[axis] >= self.size[axis] {
                return None;
            }
            index += pos[axis] * stride;
            stride *= self.size[axis];
        }
        Some(index)
    }
}

impl<T> Index<&Scale> for NVector<T> {
    type Output = T;

    fn index(&self, pos: &Scale) -> &T {
        self.get(pos).unwrap_or_else(|| {
            panic!(
                "index {pos} out of range for nvector of extent {}",
                self.size
            )
        })
    }
}

impl<T> IndexMut<&Scale> for NVector<T> {
    fn index_mut(&mut self, pos: &Scale) -> &mut T {
        let size = self.size.clone();
        self.get_mut(pos)
            .unwrap_or_else(|| panic!("index {pos} out of range for nvector of extent {size}"))
    }
}

impl<'a, T> IntoIterator for &'a NVector<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
