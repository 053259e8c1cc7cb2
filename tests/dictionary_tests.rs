use bytes::Bytes;
use parquet_chunk::*;

use test_helpers::*;

#[test]
fn test_dictionary_encoded_int32_chunk() {
    let table = ValueBatch::Int32(vec![100, 200, 300]);
    let mut scanner = ChunkBuilder::new(required_column(PhysicalType::Int32))
        .dictionary_page(&table)
        .dictionary_indices_page(Encoding::RleDictionary, &[0, 2, 1, 1, 0], 2, None)
        .scanner();

    assert!(scanner.advance());
    assert_eq!(scanner.int32s(), Some(&[100, 300, 200, 200, 100][..]));
    assert!(!scanner.advance());
    assert!(scanner.error().is_none());
}

#[test]
fn test_plain_dictionary_maps_to_same_decoder() {
    // the legacy PLAIN_DICTIONARY tag must hit the same cached decoder
    let table = ValueBatch::ByteArray(vec![
        Bytes::from_static(b"red"),
        Bytes::from_static(b"green"),
        Bytes::from_static(b"blue"),
    ]);
    let mut scanner = ChunkBuilder::new(required_column(PhysicalType::ByteArray))
        .dictionary_page(&table)
        .dictionary_indices_page(Encoding::PlainDictionary, &[2, 2, 0], 2, None)
        .scanner();

    assert!(scanner.advance());
    let decoded = scanner.byte_arrays().unwrap();
    assert_eq!(&decoded[0][..], b"blue");
    assert_eq!(&decoded[1][..], b"blue");
    assert_eq!(&decoded[2][..], b"red");
}

#[test]
fn test_dictionary_persists_across_pages() {
    let table = ValueBatch::Float64(vec![1.5, 2.5]);
    let mut scanner = ChunkBuilder::new(required_column(PhysicalType::Double))
        .dictionary_page(&table)
        .dictionary_indices_page(Encoding::RleDictionary, &[0, 1], 1, None)
        .dictionary_indices_page(Encoding::RleDictionary, &[1, 1, 1], 1, None)
        .scanner();

    assert!(scanner.advance());
    assert_eq!(scanner.float64s(), Some(&[1.5, 2.5][..]));
    assert!(scanner.advance());
    assert_eq!(scanner.float64s(), Some(&[2.5, 2.5, 2.5][..]));
    assert!(!scanner.advance());
    assert!(scanner.error().is_none());
}

#[test]
fn test_dictionary_with_optional_column() {
    let table = ValueBatch::Int64(vec![7, 8]);
    let levels = optional_levels(&[true, false, true, true]);
    let mut scanner = ChunkBuilder::new(optional_column(PhysicalType::Int64))
        .dictionary_page(&table)
        .dictionary_indices_page(Encoding::RleDictionary, &[1, 0, 1], 1, Some(&levels))
        .scanner();

    assert!(scanner.advance());
    assert_eq!(scanner.levels().len(), 4);
    assert_eq!(scanner.int64s(), Some(&[8, 7, 8][..]));
}

#[test]
fn test_second_dictionary_page_fails() {
    let table = ValueBatch::Int32(vec![1]);
    let mut scanner = ChunkBuilder::new(required_column(PhysicalType::Int32))
        .dictionary_page(&table)
        .dictionary_page(&table)
        .scanner();

    assert!(!scanner.advance());
    assert!(matches!(scanner.error(), Some(ParquetError::Format(_))));
}

#[test]
fn test_index_page_before_dictionary_page_fails() {
    // a data page with a dictionary encoding but no dictionary yet
    let mut scanner = ChunkBuilder::new(required_column(PhysicalType::Int32))
        .dictionary_indices_page(Encoding::RleDictionary, &[0], 0, None)
        .scanner();

    assert!(!scanner.advance());
    assert!(matches!(scanner.error(), Some(ParquetError::Format(_))));
}

#[test]
fn test_out_of_range_index_fails() {
    let table = ValueBatch::Int32(vec![10, 20]);
    let mut scanner = ChunkBuilder::new(required_column(PhysicalType::Int32))
        .dictionary_page(&table)
        .dictionary_indices_page(Encoding::RleDictionary, &[0, 5], 5, None)
        .scanner();

    assert!(!scanner.advance());
    assert!(matches!(scanner.error(), Some(ParquetError::Format(_))));
}

#[test]
fn test_dictionary_error_is_sticky() {
    let table = ValueBatch::Int32(vec![1]);
    let mut scanner = ChunkBuilder::new(required_column(PhysicalType::Int32))
        .dictionary_page(&table)
        .dictionary_page(&table)
        .dictionary_indices_page(Encoding::RleDictionary, &[0], 0, None)
        .scanner();

    assert!(!scanner.advance());
    let message = scanner.error().unwrap().to_string();
    assert!(!scanner.advance());
    assert_eq!(scanner.error().unwrap().to_string(), message);
}
