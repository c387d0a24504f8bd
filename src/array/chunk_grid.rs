//! The regular chunk grid.
//!
//! An array is partitioned into equally shaped chunks aligned to multiples of
//! the chunk shape. Chunks on the upper boundary may extend past the array
//! shape; reads and writes clip them to the array extent.

use std::num::NonZeroU64;

use crate::array_subset::{ArraySubset, IncompatibleDimensionalityError};

/// A regular chunk grid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegularChunkGrid {
    chunk_shape: Vec<NonZeroU64>,
}

impl RegularChunkGrid {
    /// Create a new regular chunk grid with `chunk_shape`.
    #[must_use]
    pub fn new(chunk_shape: Vec<NonZeroU64>) -> Self {
        Self { chunk_shape }
    }

    /// The chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// The chunk shape with plain `u64` extents.
    #[must_use]
    pub fn chunk_shape_u64(&self) -> Vec<u64> {
        self.chunk_shape.iter().map(|size| size.get()).collect()
    }

    /// The dimensionality of the chunk grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.chunk_shape.len()
    }

    /// The shape of the chunk grid for an array of `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `array_shape` does not match the chunk grid.
    pub fn grid_shape(&self, array_shape: &[u64]) -> Result<Vec<u64>, IncompatibleDimensionalityError> {
        if array_shape.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                array_shape.len(),
                self.dimensionality(),
            ));
        }
        Ok(std::iter::zip(array_shape, &self.chunk_shape)
            .map(|(array, chunk)| array.div_ceil(chunk.get()))
            .collect())
    }

    /// The origin of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `chunk_indices` does not match the chunk grid.
    pub fn chunk_origin(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<u64>, IncompatibleDimensionalityError> {
        if chunk_indices.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                chunk_indices.len(),
                self.dimensionality(),
            ));
        }
        Ok(std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(index, extent)| index * extent.get())
            .collect())
    }

    /// The subset of the array covered by the chunk at `chunk_indices`.
    ///
    /// The subset spans the full chunk extent and may extend past the array
    /// shape on the upper boundary.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `chunk_indices` does not match the chunk grid.
    pub fn chunk_subset(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        let origin = self.chunk_origin(chunk_indices)?;
        Ok(unsafe { ArraySubset::new_with_start_shape_unchecked(origin, self.chunk_shape_u64()) })
    }

    /// The indices of the chunk holding the element at `array_indices`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `array_indices` does not match the chunk grid.
    pub fn chunk_indices(
        &self,
        array_indices: &[u64],
    ) -> Result<Vec<u64>, IncompatibleDimensionalityError> {
        if array_indices.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                array_indices.len(),
                self.dimensionality(),
            ));
        }
        Ok(std::iter::zip(array_indices, &self.chunk_shape)
            .map(|(index, extent)| index / extent.get())
            .collect())
    }

    /// The subset of the chunk grid intersecting `array_subset`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `array_subset` does not match the chunk grid.
    pub fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        if array_subset.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                array_subset.dimensionality(),
                self.dimensionality(),
            ));
        }
        if array_subset.is_empty() {
            return Ok(ArraySubset::new_empty(self.dimensionality()));
        }
        let start = self.chunk_indices(array_subset.start())?;
        let end = self.chunk_indices(&array_subset.end_inc())?;
        ArraySubset::new_with_start_end_inc(start, &end)
    }
}
