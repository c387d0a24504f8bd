//! A storage engine for chunked, compressed, self-describing
//! multidimensional arrays.
//!
//! An array is split into a regular grid of chunks, each encoded through a
//! codec chain and stored as one value in a key-value store. The array is
//! described by a versioned JSON metadata document stored alongside its
//! chunks, so any party holding the store can interpret the data.
//!
//! ```
//! # use std::sync::Arc;
//! # use std::num::NonZeroU64;
//! use gridstore::array::{ArrayBuilder, DataType, FillValue};
//! use gridstore::array_subset::ArraySubset;
//! use gridstore::storage::store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let array = ArrayBuilder::new(
//!     vec![100, 100],
//!     DataType::Float32,
//!     vec![NonZeroU64::new(50).unwrap(); 2],
//!     FillValue::from(0.0f32),
//! )
//! .build(store, "/group/array")?;
//! array.store_metadata()?;
//!
//! array.store_array_subset_elements::<f32>(
//!     &ArraySubset::new_with_ranges(&[60..70, 0..5]),
//!     vec![1.0; 50],
//! )?;
//!
//! let elements = array
//!     .retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_ranges(&[59..70, 0..5]))?;
//! assert_eq!(elements.len(), 55);
//! assert_eq!(&elements[..5], &[0.0; 5]); // row 59 is untouched, so fill value
//! assert_eq!(&elements[5..10], &[1.0; 5]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//! - `crc32c` (default): the `crc32c` checksum codec.
//! - `gzip` (default): the `gzip` compression codec.
//! - `zstd` (default): the `zstd` compression codec.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![deny(missing_docs)]

pub mod array;
pub mod array_subset;
pub mod byte_range;
pub mod metadata;
pub mod node_path;
pub mod plugin;
pub mod storage;
