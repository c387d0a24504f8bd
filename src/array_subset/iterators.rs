//! Iterators over [`ArraySubset`] elements and chunks.
//!
//! All iterators visit elements in row-major order (last dimension fastest).

use std::iter::FusedIterator;
use std::num::NonZeroU64;

use itertools::izip;

use crate::array::ravel_indices;

use super::{ArraySubset, IncompatibleArraySubsetAndShapeError, IncompatibleDimensionalityError};

/// The element indices of an array subset.
pub struct Indices {
    subset: ArraySubset,
}

impl Indices {
    /// Create a new indices iterable for `subset`.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        Self { subset }
    }

    /// Returns the number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subset.num_elements_usize()
    }

    /// Returns true if there are no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subset.is_empty()
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = Vec<u64>;
    type IntoIter = IndicesIterator;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator::new(self.subset.clone())
    }
}

impl IntoIterator for Indices {
    type Item = Vec<u64>;
    type IntoIter = IndicesIterator;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator::new(self.subset)
    }
}

/// Serial iterator over the element indices of an array subset.
pub struct IndicesIterator {
    subset: ArraySubset,
    index: u64,
    num_elements: u64,
}

impl IndicesIterator {
    fn new(subset: ArraySubset) -> Self {
        let num_elements = subset.num_elements();
        Self {
            subset,
            index: 0,
            num_elements,
        }
    }
}

impl Iterator for IndicesIterator {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.num_elements {
            return None;
        }
        let mut remainder = self.index;
        let mut indices = vec![0u64; self.subset.dimensionality()];
        for (out, &start, &size) in izip!(
            indices.iter_mut().rev(),
            self.subset.start().iter().rev(),
            self.subset.shape().iter().rev(),
        ) {
            *out = start + remainder % size;
            remainder /= size;
        }
        self.index += 1;
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.num_elements - self.index).unwrap();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicesIterator {}

impl FusedIterator for IndicesIterator {}

/// The linearised element indices of an array subset within an array.
pub struct LinearisedIndices {
    subset: ArraySubset,
    array_shape: Vec<u64>,
}

impl LinearisedIndices {
    /// Create a new linearised indices iterable for `subset` within an array of `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate `subset`.
    pub fn new(
        subset: ArraySubset,
        array_shape: Vec<u64>,
    ) -> Result<Self, IncompatibleArraySubsetAndShapeError> {
        if subset.inbounds(&array_shape) {
            Ok(Self {
                subset,
                array_shape,
            })
        } else {
            Err(IncompatibleArraySubsetAndShapeError(subset, array_shape))
        }
    }

    /// Returns the number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subset.num_elements_usize()
    }

    /// Returns true if there are no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subset.is_empty()
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> LinearisedIndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a LinearisedIndices {
    type Item = u64;
    type IntoIter = LinearisedIndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LinearisedIndicesIterator {
            inner: IndicesIterator::new(self.subset.clone()),
            array_shape: &self.array_shape,
        }
    }
}

/// Serial iterator over the linearised element indices of an array subset.
pub struct LinearisedIndicesIterator<'a> {
    inner: IndicesIterator,
    array_shape: &'a [u64],
}

impl Iterator for LinearisedIndicesIterator<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|indices| ravel_indices(&indices, self.array_shape))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for LinearisedIndicesIterator<'_> {}

impl FusedIterator for LinearisedIndicesIterator<'_> {}

/// The contiguous element runs of an array subset within an array, linearised.
///
/// Trailing dimensions fully covered by the subset coalesce into longer runs.
pub struct ContiguousLinearisedIndices {
    runs: ArraySubset,
    array_shape: Vec<u64>,
    contiguous_elements: u64,
}

impl ContiguousLinearisedIndices {
    /// Create a new contiguous linearised indices iterable for `subset` within an array of `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate `subset`.
    pub fn new(
        subset: ArraySubset,
        array_shape: Vec<u64>,
    ) -> Result<Self, IncompatibleArraySubsetAndShapeError> {
        if !subset.inbounds(&array_shape) {
            return Err(IncompatibleArraySubsetAndShapeError(subset, array_shape));
        }
        let mut contiguous = true;
        let mut contiguous_elements = 1;
        let mut runs_shape = vec![0u64; subset.dimensionality()];
        for (runs_size, &start, &size, &array_size) in izip!(
            runs_shape.iter_mut().rev(),
            subset.start().iter().rev(),
            subset.shape().iter().rev(),
            array_shape.iter().rev(),
        ) {
            if contiguous {
                contiguous_elements *= size;
                *runs_size = 1;
                contiguous = start == 0 && size == array_size;
            } else {
                *runs_size = size;
            }
        }
        let runs = unsafe {
            ArraySubset::new_with_start_shape_unchecked(subset.start().to_vec(), runs_shape)
        };
        Ok(Self {
            runs,
            array_shape,
            contiguous_elements,
        })
    }

    /// Returns the number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.num_elements_usize()
    }

    /// Returns true if there are no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the run length (fixed across all runs).
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> ContiguousLinearisedIndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a ContiguousLinearisedIndices {
    type Item = (u64, u64);
    type IntoIter = ContiguousLinearisedIndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        ContiguousLinearisedIndicesIterator {
            inner: IndicesIterator::new(self.runs.clone()),
            array_shape: &self.array_shape,
            contiguous_elements: self.contiguous_elements,
        }
    }
}

/// Serial iterator over `(linearised index, run length)` pairs of contiguous runs.
pub struct ContiguousLinearisedIndicesIterator<'a> {
    inner: IndicesIterator,
    array_shape: &'a [u64],
    contiguous_elements: u64,
}

impl Iterator for ContiguousLinearisedIndicesIterator<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|indices| {
            (
                ravel_indices(&indices, self.array_shape),
                self.contiguous_elements,
            )
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ContiguousLinearisedIndicesIterator<'_> {}

impl FusedIterator for ContiguousLinearisedIndicesIterator<'_> {}

/// The regular chunks overlapping an array subset.
///
/// Chunk subsets are in array coordinates and may extend past the bounds of
/// the originating subset (and the array, for boundary chunks).
pub struct Chunks {
    chunks: ArraySubset,
    chunk_shape: Vec<u64>,
}

impl Chunks {
    /// Create a new chunks iterable for `subset` and `chunk_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `chunk_shape` differs from the subset dimensionality.
    pub fn new(
        subset: &ArraySubset,
        chunk_shape: &[NonZeroU64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if subset.dimensionality() != chunk_shape.len() {
            return Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                subset.dimensionality(),
            ));
        }
        let chunk_shape: Vec<u64> = chunk_shape.iter().map(|size| size.get()).collect();
        let chunks = if subset.is_empty() {
            ArraySubset::new_empty(subset.dimensionality())
        } else {
            let chunk_start: Vec<u64> = std::iter::zip(subset.start(), &chunk_shape)
                .map(|(index, size)| index / size)
                .collect();
            let chunk_end_inc: Vec<u64> = std::iter::zip(subset.end_inc(), &chunk_shape)
                .map(|(index, size)| index / size)
                .collect();
            ArraySubset::new_with_start_end_inc(chunk_start, &chunk_end_inc)
                .expect("dimensionalities match")
        };
        Ok(Self {
            chunks,
            chunk_shape,
        })
    }

    /// Returns the number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.num_elements_usize()
    }

    /// Returns true if there are no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> ChunksIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Chunks {
    type Item = (Vec<u64>, ArraySubset);
    type IntoIter = ChunksIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        ChunksIterator {
            inner: IndicesIterator::new(self.chunks.clone()),
            chunk_shape: &self.chunk_shape,
        }
    }
}

/// Serial iterator over `(chunk indices, chunk subset)` pairs.
pub struct ChunksIterator<'a> {
    inner: IndicesIterator,
    chunk_shape: &'a [u64],
}

impl Iterator for ChunksIterator<'_> {
    type Item = (Vec<u64>, ArraySubset);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|chunk_indices| {
            let start = std::iter::zip(&chunk_indices, self.chunk_shape)
                .map(|(index, size)| index * size)
                .collect();
            let chunk_subset = unsafe {
                ArraySubset::new_with_start_shape_unchecked(start, self.chunk_shape.to_vec())
            };
            (chunk_indices, chunk_subset)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ChunksIterator<'_> {}

impl FusedIterator for ChunksIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_row_major() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 5..7]);
        let indices: Vec<_> = subset.indices().into_iter().collect();
        assert_eq!(
            indices,
            vec![vec![1, 5], vec![1, 6], vec![2, 5], vec![2, 6]]
        );
    }

    #[test]
    fn indices_empty() {
        let subset = ArraySubset::new_with_ranges(&[1..1, 5..7]);
        assert_eq!(subset.indices().into_iter().count(), 0);
    }

    #[test]
    fn linearised_indices() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 5..7]);
        let linearised = subset.linearised_indices(&[4, 8]).unwrap();
        assert_eq!(linearised.iter().collect::<Vec<_>>(), vec![13, 14, 21, 22]);
        assert!(subset.linearised_indices(&[4, 6]).is_err());
    }

    #[test]
    fn contiguous_linearised_indices() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 0..8]);
        let contiguous = subset.contiguous_linearised_indices(&[4, 8]).unwrap();
        assert_eq!(contiguous.contiguous_elements(), 16);
        assert_eq!(contiguous.iter().collect::<Vec<_>>(), vec![(8, 16)]);

        let subset = ArraySubset::new_with_ranges(&[1..3, 2..4]);
        let contiguous = subset.contiguous_linearised_indices(&[4, 8]).unwrap();
        assert_eq!(contiguous.contiguous_elements(), 2);
        assert_eq!(contiguous.iter().collect::<Vec<_>>(), vec![(10, 2), (18, 2)]);
    }

    #[test]
    fn chunks() {
        let subset = ArraySubset::new_with_ranges(&[1..5, 2..3]);
        let chunk_shape = [NonZeroU64::new(2).unwrap(), NonZeroU64::new(2).unwrap()];
        let chunks: Vec<_> = subset.chunks(&chunk_shape).unwrap().iter().collect();
        assert_eq!(
            chunks,
            vec![
                (vec![0, 1], ArraySubset::new_with_ranges(&[0..2, 2..4])),
                (vec![1, 1], ArraySubset::new_with_ranges(&[2..4, 2..4])),
                (vec![2, 1], ArraySubset::new_with_ranges(&[4..6, 2..4])),
            ]
        );
    }
}
