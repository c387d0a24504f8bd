//! Array subsets.
//!
//! An [`ArraySubset`] is a selection: a start and a shape, one entry per
//! dimension, identifying a hyperrectangular region of an array. Subsets are
//! created per read/write call, validated against the array shape before
//! dispatch, and discarded after use.
//!
//! All iteration over a subset is row-major (C order, last dimension
//! fastest); this convention is fixed for the whole crate.

pub mod iterators;

use std::num::NonZeroU64;
use std::ops::Range;

use thiserror::Error;

use crate::byte_range::ByteRange;

use iterators::{Chunks, ContiguousLinearisedIndices, Indices, LinearisedIndices};

/// A subset of an array: a start index and an extent per dimension.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ArraySubset {
    /// The start of the array subset.
    start: Vec<u64>,
    /// The shape of the array subset.
    shape: Vec<u64>,
}

/// An incompatible dimensionality.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new [`IncompatibleDimensionalityError`] with `got` and `expected` dimensionalities.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An array subset and an array shape with incompatible dimensionality or extent.
#[derive(Clone, Debug, Error)]
#[error("array subset {0} is incompatible with array shape {1:?}")]
pub struct IncompatibleArraySubsetAndShapeError(ArraySubset, Vec<u64>);

impl IncompatibleArraySubsetAndShapeError {
    /// Create a new [`IncompatibleArraySubsetAndShapeError`].
    #[must_use]
    pub fn new(subset: ArraySubset, shape: Vec<u64>) -> Self {
        Self(subset, shape)
    }
}

impl std::fmt::Display for ArraySubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_ranges())
    }
}

impl ArraySubset {
    /// Create an empty array subset with `dimensionality`.
    #[must_use]
    pub fn new_empty(dimensionality: usize) -> Self {
        Self {
            start: vec![0; dimensionality],
            shape: vec![0; dimensionality],
        }
    }

    /// Create an array subset at the origin with `shape`.
    #[must_use]
    pub fn new_with_shape(shape: Vec<u64>) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create an array subset from `start` and `shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the lengths of `start` and `shape` differ.
    pub fn new_with_start_shape(
        start: Vec<u64>,
        shape: Vec<u64>,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError(shape.len(), start.len()))
        }
    }

    /// Create an array subset from `start` and `shape` without checking dimensionality.
    ///
    /// # Safety
    /// The lengths of `start` and `shape` must match.
    #[must_use]
    pub unsafe fn new_with_start_shape_unchecked(start: Vec<u64>, shape: Vec<u64>) -> Self {
        debug_assert_eq!(start.len(), shape.len());
        Self { start, shape }
    }

    /// Create an array subset from `start` and `end_inc` (inclusive end).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the lengths of `start` and `end_inc` differ.
    pub fn new_with_start_end_inc(
        start: Vec<u64>,
        end_inc: &[u64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == end_inc.len() {
            let shape = std::iter::zip(&start, end_inc)
                .map(|(&start, &end)| end.saturating_sub(start) + 1)
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError(end_inc.len(), start.len()))
        }
    }

    /// Create an array subset from per-dimension `ranges`.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Returns the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Returns the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Returns the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Returns the exclusive end of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> Vec<u64> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Returns the inclusive end of the array subset.
    ///
    /// # Panics
    /// Panics if the subset is empty in any dimension.
    #[must_use]
    pub fn end_inc(&self) -> Vec<u64> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size - 1)
            .collect()
    }

    /// Returns the number of elements in the array subset.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Returns the number of elements in the array subset as a `usize`.
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Returns true if the array subset contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Returns the array subset as per-dimension ranges.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start + size)
            .collect()
    }

    /// Returns true if the array subset fits within an array of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && itertools::izip!(&self.start, &self.shape, array_shape)
                .all(|(&start, &size, &array_size)| start + size <= array_size)
    }

    /// Returns true if the array subset contains `indices`.
    #[must_use]
    pub fn contains(&self, indices: &[u64]) -> bool {
        indices.len() == self.dimensionality()
            && itertools::izip!(indices, &self.start, &self.shape)
                .all(|(&index, &start, &size)| index >= start && index < start + size)
    }

    /// Returns the intersection of this array subset with `other`.
    ///
    /// The result is in the same (absolute) coordinates as the inputs.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `other` differs.
    pub fn overlap(&self, other: &ArraySubset) -> Result<Self, IncompatibleDimensionalityError> {
        if other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError(
                other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let start: Vec<u64> = std::iter::zip(&self.start, &other.start)
            .map(|(&a, &b)| std::cmp::max(a, b))
            .collect();
        let shape = itertools::izip!(&start, self.end_exc(), other.end_exc())
            .map(|(&start, a, b)| std::cmp::min(a, b).saturating_sub(start))
            .collect();
        Ok(Self { start, shape })
    }

    /// Returns this array subset rebased to be relative to `start`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `start` differs.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError(
                start.len(),
                self.dimensionality(),
            ));
        }
        Ok(Self {
            start: std::iter::zip(&self.start, start)
                .map(|(&index, &offset)| index - offset)
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Returns an iterator over the element indices of the array subset.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// Returns an iterator over linearised element indices within an array of `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate this subset.
    pub fn linearised_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<LinearisedIndices, IncompatibleArraySubsetAndShapeError> {
        LinearisedIndices::new(self.clone(), array_shape.to_vec())
    }

    /// Returns an iterator over `(linearised index, run length)` pairs of
    /// contiguous element runs within an array of `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate this subset.
    pub fn contiguous_linearised_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<ContiguousLinearisedIndices, IncompatibleArraySubsetAndShapeError> {
        ContiguousLinearisedIndices::new(self.clone(), array_shape.to_vec())
    }

    /// Returns an iterator over the chunks of `chunk_shape` overlapping the array subset.
    ///
    /// Each item is a `(chunk indices, chunk subset)` pair; the chunk subset
    /// is in array coordinates and may extend past this subset's bounds.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `chunk_shape` differs.
    pub fn chunks(
        &self,
        chunk_shape: &[NonZeroU64],
    ) -> Result<Chunks, IncompatibleDimensionalityError> {
        Chunks::new(self, chunk_shape)
    }

    /// Returns the byte ranges of the array subset within the row-major byte
    /// representation of an array of `array_shape` with `element_size` byte elements.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate this subset.
    pub fn byte_ranges(
        &self,
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<ByteRange>, IncompatibleArraySubsetAndShapeError> {
        let element_size = element_size as u64;
        let contiguous = self.contiguous_linearised_indices(array_shape)?;
        let mut byte_ranges = Vec::with_capacity(contiguous.len());
        for (index, run_length) in &contiguous {
            byte_ranges.push(ByteRange::FromStart(
                index * element_size,
                Some(run_length * element_size),
            ));
        }
        Ok(byte_ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_ranges() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 0..4]);
        assert_eq!(subset.start(), &[1, 0]);
        assert_eq!(subset.shape(), &[2, 4]);
        assert_eq!(subset.end_exc(), vec![3, 4]);
        assert_eq!(subset.end_inc(), vec![2, 3]);
        assert_eq!(subset.num_elements(), 8);
        assert_eq!(subset.to_ranges(), vec![1..3, 0..4]);
        assert!(!subset.is_empty());
        assert!(ArraySubset::new_empty(2).is_empty());
    }

    #[test]
    fn array_subset_inbounds() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 0..4]);
        assert!(subset.inbounds(&[3, 4]));
        assert!(!subset.inbounds(&[2, 4]));
        assert!(!subset.inbounds(&[3, 4, 5]));
        assert!(subset.contains(&[2, 3]));
        assert!(!subset.contains(&[0, 0]));
    }

    #[test]
    fn array_subset_overlap() {
        let a = ArraySubset::new_with_ranges(&[0..4, 2..6]);
        let b = ArraySubset::new_with_ranges(&[2..6, 0..4]);
        let overlap = a.overlap(&b).unwrap();
        assert_eq!(overlap, ArraySubset::new_with_ranges(&[2..4, 2..4]));
        assert!(a.overlap(&ArraySubset::new_empty(3)).is_err());

        let disjoint = a
            .overlap(&ArraySubset::new_with_ranges(&[10..12, 10..12]))
            .unwrap();
        assert!(disjoint.is_empty());
    }

    #[test]
    fn array_subset_relative_to() {
        let subset = ArraySubset::new_with_ranges(&[2..4, 2..4]);
        let relative = subset.relative_to(&[2, 0]).unwrap();
        assert_eq!(relative, ArraySubset::new_with_ranges(&[0..2, 2..4]));
        assert!(subset.relative_to(&[0]).is_err());
    }

    #[test]
    fn array_subset_byte_ranges() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let byte_ranges = subset.byte_ranges(&[4, 4], 2).unwrap();
        assert_eq!(
            byte_ranges,
            vec![
                ByteRange::FromStart(10, Some(4)),
                ByteRange::FromStart(18, Some(4)),
            ]
        );
    }

    #[test]
    fn array_subset_byte_ranges_contiguous() {
        // spans full rows, so runs coalesce across the first dimension
        let subset = ArraySubset::new_with_ranges(&[1..3, 0..4]);
        let byte_ranges = subset.byte_ranges(&[4, 4], 1).unwrap();
        assert_eq!(byte_ranges, vec![ByteRange::FromStart(4, Some(8))]);
    }
}
