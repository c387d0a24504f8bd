#![allow(missing_docs)]

use std::num::NonZeroU64;
use std::sync::Arc;

use gridstore::array::{
    Array, ArrayBuilder, ArrayBytes, ArrayError, DataType, FillValue,
};
use gridstore::array_subset::ArraySubset;
use gridstore::storage::store::{FilesystemStore, MemoryStore};
use gridstore::storage::{ListableStorageTraits, ReadableStorageTraits, WritableStorageTraits};

fn build_f32_array<TStorage: ?Sized>(storage: Arc<TStorage>) -> Array<TStorage> {
    ArrayBuilder::new(
        vec![100, 100],
        DataType::Float32,
        vec![NonZeroU64::new(50).unwrap(); 2],
        FillValue::from(0.0f32),
    )
    .build(storage, "/group/array")
    .unwrap()
}

#[test]
fn array_read_write_subset() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store.clone());
    array.store_metadata().unwrap();

    // an arange over the whole array spans all four chunks
    let elements: Vec<f32> = (0..100 * 100).map(|i| i as f32).collect();
    array
        .store_array_subset_elements::<f32>(
            &ArraySubset::new_with_ranges(&[0..100, 0..100]),
            elements,
        )
        .unwrap();
    assert_eq!(store.list().unwrap().len(), 5); // metadata + four chunks

    let subset = ArraySubset::new_with_ranges(&[60..70, 0..5]);
    let retrieved = array
        .retrieve_array_subset_elements::<f32>(&subset)
        .unwrap();
    assert_eq!(retrieved.len(), 50);
    for (i, row) in (60..70).enumerate() {
        for col in 0..5 {
            assert_eq!(retrieved[i * 5 + col], (row * 100 + col) as f32);
        }
    }

    // a selection straddling both chunk boundaries
    let subset = ArraySubset::new_with_ranges(&[48..52, 48..52]);
    let retrieved = array
        .retrieve_array_subset_elements::<f32>(&subset)
        .unwrap();
    assert_eq!(retrieved.len(), 16);
    for (i, row) in (48..52).enumerate() {
        for (j, col) in (48..52).enumerate() {
            assert_eq!(retrieved[i * 4 + j], (row * 100 + col) as f32);
        }
    }
}

#[test]
fn array_fill_value_reads() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store);

    // no chunk has been written, every read is the fill value
    let subset = ArraySubset::new_with_ranges(&[98..100, 0..3]);
    assert_eq!(
        array.retrieve_array_subset_elements::<f32>(&subset).unwrap(),
        vec![0.0; 6]
    );
    assert_eq!(
        array.retrieve_chunk_elements::<f32>(&[1, 1]).unwrap(),
        vec![0.0; 2500]
    );
}

#[test]
fn array_partial_write_does_not_bleed() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store);

    let subset = ArraySubset::new_with_ranges(&[49..51, 49..51]);
    array
        .store_array_subset_elements::<f32>(&subset, vec![1.0; 4])
        .unwrap();

    // the written region reads back
    assert_eq!(
        array.retrieve_array_subset_elements::<f32>(&subset).unwrap(),
        vec![1.0; 4]
    );
    // the surrounding elements of all four touched chunks are still fill
    let surround = ArraySubset::new_with_ranges(&[48..49, 0..100]);
    assert_eq!(
        array
            .retrieve_array_subset_elements::<f32>(&surround)
            .unwrap(),
        vec![0.0; 100]
    );
    let surround = ArraySubset::new_with_ranges(&[0..100, 48..49]);
    assert_eq!(
        array
            .retrieve_array_subset_elements::<f32>(&surround)
            .unwrap(),
        vec![0.0; 100]
    );
}

#[test]
fn array_out_of_bounds_touches_no_keys() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store.clone());
    array.store_metadata().unwrap();
    let keys_before = store.list().unwrap();

    // reads and writes beyond the array bounds fail before any store access
    let subset = ArraySubset::new_with_ranges(&[90..110, 0..5]);
    assert!(matches!(
        array.retrieve_array_subset_elements::<f32>(&subset),
        Err(ArrayError::InvalidArraySubset(..))
    ));
    assert!(matches!(
        array.store_array_subset_elements::<f32>(&subset, vec![0.0; 100]),
        Err(ArrayError::InvalidArraySubset(..))
    ));
    assert!(matches!(
        array.retrieve_chunk(&[2, 0]),
        Err(ArrayError::InvalidChunkGridIndices(..))
    ));
    assert!(matches!(
        array.store_chunk_elements::<f32>(&[0, 2], vec![0.0; 2500]),
        Err(ArrayError::InvalidChunkGridIndices(..))
    ));

    assert_eq!(store.list().unwrap(), keys_before);
}

#[test]
fn array_shape_mismatch() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store);

    assert!(matches!(
        array.store_chunk_elements::<f32>(&[0, 0], vec![0.0; 100]),
        Err(ArrayError::InvalidBytesInputSize(..))
    ));
    assert!(matches!(
        array.store_array_subset_elements::<f32>(
            &ArraySubset::new_with_ranges(&[0..2, 0..2]),
            vec![0.0; 5]
        ),
        Err(ArrayError::InvalidBytesInputSize(..))
    ));
    assert!(matches!(
        array.retrieve_chunk_elements::<u8>(&[0, 0]),
        Err(ArrayError::IncompatibleElementSize(1, 4))
    ));
}

#[test]
fn array_fill_value_chunks_are_erased() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store.clone());

    array
        .store_chunk_elements::<f32>(&[0, 0], vec![1.0; 2500])
        .unwrap();
    assert_eq!(store.list().unwrap().len(), 1);

    // overwriting with the fill value erases the chunk key
    array
        .store_chunk_elements::<f32>(&[0, 0], vec![0.0; 2500])
        .unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn array_erase_chunks() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store.clone());

    for chunk in [[0u64, 0], [0, 1], [1, 0], [1, 1]] {
        array
            .store_chunk_elements::<f32>(&chunk, vec![1.0; 2500])
            .unwrap();
    }
    assert_eq!(store.list().unwrap().len(), 4);

    array
        .erase_chunks(&ArraySubset::new_with_ranges(&[0..1, 0..2]))
        .unwrap();
    assert_eq!(store.list().unwrap().len(), 2);
    assert_eq!(
        array.retrieve_chunk_elements::<f32>(&[0, 0]).unwrap(),
        vec![0.0; 2500]
    );
    assert_eq!(
        array.retrieve_chunk_elements::<f32>(&[1, 1]).unwrap(),
        vec![1.0; 2500]
    );
}

#[test]
fn array_vlen_strings_across_chunks() {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![4],
        DataType::String,
        vec![NonZeroU64::new(2).unwrap()],
        FillValue::from(""),
    )
    .build(store, "/strings")
    .unwrap();

    let subset = ArraySubset::new_with_ranges(&[1..4]);
    array
        .store_array_subset(
            &subset,
            ArrayBytes::from_vlen_elements(&["b", "cc", "ddd"]),
        )
        .unwrap();

    let all = array
        .retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..4]))
        .unwrap();
    assert_eq!(
        all.into_vlen_elements().unwrap(),
        vec![b"".to_vec(), b"b".to_vec(), b"cc".to_vec(), b"ddd".to_vec()]
    );

    let partial = array
        .retrieve_array_subset(&ArraySubset::new_with_ranges(&[2..4]))
        .unwrap();
    assert_eq!(
        partial.into_vlen_elements().unwrap(),
        vec![b"cc".to_vec(), b"ddd".to_vec()]
    );
}

#[test]
fn array_vlen_element_tiling_fill_value_is_stored() {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![1],
        DataType::String,
        vec![NonZeroU64::new(1).unwrap()],
        FillValue::from("ab"),
    )
    .build(store.clone(), "/strings")
    .unwrap();

    // "abab" tiles the fill value byte-wise but is a different element
    array
        .store_chunk(&[0], ArrayBytes::from_vlen_elements(&["abab"]))
        .unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
    assert_eq!(
        array.retrieve_chunk(&[0]).unwrap().into_vlen_elements().unwrap(),
        vec![b"abab".to_vec()]
    );

    // a chunk of genuine fill-value elements is still erased
    array
        .store_chunk(&[0], ArrayBytes::from_vlen_elements(&["ab"]))
        .unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn array_resize_and_attributes_reopen() {
    let store = Arc::new(MemoryStore::new());
    let mut array = build_f32_array(store.clone());
    array.store_metadata().unwrap();

    array.set_shape(vec![150, 100]).unwrap();
    array
        .attributes_mut()
        .insert("units".to_string(), "kelvin".into());
    array.store_metadata().unwrap();

    let reopened = Array::open(store, "/group/array").unwrap();
    assert_eq!(reopened.shape(), &[150, 100]);
    assert_eq!(reopened.chunk_grid_shape(), vec![3, 2]);
    assert_eq!(
        reopened.attributes().get("units"),
        Some(&serde_json::Value::from("kelvin"))
    );
}

#[test]
fn array_unknown_metadata_fields_preserved() {
    let store = Arc::new(MemoryStore::new());
    let array = build_f32_array(store.clone());
    array.store_metadata().unwrap();

    // splice an unknown optional field into the stored document
    let meta_key = array.meta_key();
    let mut document: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&store.get(&meta_key).unwrap().unwrap()).unwrap();
    document.insert("color_hint".to_string(), serde_json::json!({"cmap": "viridis"}));
    store
        .set(&meta_key, &serde_json::to_vec(&document).unwrap())
        .unwrap();

    // the field survives open and metadata rewrite
    let reopened = Array::open(store.clone(), "/group/array").unwrap();
    reopened.store_metadata().unwrap();
    let document: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&store.get(&meta_key).unwrap().unwrap()).unwrap();
    assert_eq!(
        document.get("color_hint"),
        Some(&serde_json::json!({"cmap": "viridis"}))
    );

    // a required unknown field refuses to open
    let mut document = document;
    document.insert(
        "sharding".to_string(),
        serde_json::json!({"must_understand": true}),
    );
    store
        .set(&meta_key, &serde_json::to_vec(&document).unwrap())
        .unwrap();
    assert!(Array::open(store, "/group/array").is_err());
}

#[cfg(feature = "crc32c")]
#[test]
fn array_corrupt_chunk_fails_checksum() {
    use gridstore::array::codec::crc32c::Crc32cCodec;
    use gridstore::array::codec::CodecError;

    let store = Arc::new(MemoryStore::new());
    let mut builder = ArrayBuilder::new(
        vec![4],
        DataType::UInt32,
        vec![NonZeroU64::new(4).unwrap()],
        FillValue::from(0u32),
    );
    builder.bytes_to_bytes_codecs(vec![Box::new(Crc32cCodec::new())]);
    let array = builder.build(store.clone(), "/checksummed").unwrap();

    array
        .store_chunk_elements::<u32>(&[0], vec![1, 2, 3, 4])
        .unwrap();

    let chunk_key = array.chunk_key(&[0]);
    let mut encoded = store.get(&chunk_key).unwrap().unwrap();
    encoded[0] ^= 0xff;
    store.set(&chunk_key, &encoded).unwrap();

    assert!(matches!(
        array.retrieve_chunk(&[0]),
        Err(ArrayError::CodecError(CodecError::InvalidChecksum))
    ));
}

#[cfg(all(feature = "gzip", feature = "crc32c"))]
#[test]
fn array_compressed_round_trip() {
    use gridstore::array::codec::crc32c::Crc32cCodec;
    use gridstore::array::codec::gzip::GzipCodec;

    let store = Arc::new(MemoryStore::new());
    let mut builder = ArrayBuilder::new(
        vec![16, 16],
        DataType::UInt16,
        vec![NonZeroU64::new(8).unwrap(); 2],
        FillValue::from(0u16),
    );
    builder.bytes_to_bytes_codecs(vec![
        Box::new(GzipCodec::new(5).unwrap()),
        Box::new(Crc32cCodec::new()),
    ]);
    let array = builder.build(store, "/compressed").unwrap();

    let elements: Vec<u16> = (0..256).collect();
    array
        .store_array_subset_elements::<u16>(&ArraySubset::new_with_ranges(&[0..16, 0..16]), elements.clone())
        .unwrap();
    assert_eq!(
        array
            .retrieve_array_subset_elements::<u16>(&ArraySubset::new_with_ranges(&[0..16, 0..16]))
            .unwrap(),
        elements
    );
}

#[test]
fn array_filesystem_store_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(FilesystemStore::new(dir.path()).unwrap());
    let array = build_f32_array(store.clone());
    array.store_metadata().unwrap();

    let subset = ArraySubset::new_with_ranges(&[10..20, 40..60]);
    let elements: Vec<f32> = (0..200).map(|i| i as f32).collect();
    array
        .store_array_subset_elements::<f32>(&subset, elements.clone())
        .unwrap();

    // metadata and chunk files land under the array path
    assert!(dir.path().join("group/array/array.json").exists());
    assert!(dir.path().join("group/array/c/0/0").exists());

    let reopened = Array::open(store, "/group/array").unwrap();
    assert_eq!(
        reopened
            .retrieve_array_subset_elements::<f32>(&subset)
            .unwrap(),
        elements
    );
}
