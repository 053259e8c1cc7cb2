//! Column-chunk layer of the Parquet on-disk format
//!
//! `parquet-chunk` turns a stream of bytes addressed by a byte offset into
//! typed, nullable, possibly-repeated values: page-header parsing,
//! per-encoding value decoding, and the sequential page-scanning protocol
//! that walks a column chunk from its starting offset to its end.
//!
//! # Key Components
//!
//! - **Scanner**: pull-based column-chunk reader
//!   - One data page per [`reader::ColumnScanner::advance`] call
//!   - Sticky first-error semantics; clean end-of-stream is not an error
//!   - Works with any source implementing `Read + Seek`
//!
//! - **Encodings**: the physical value codecs
//!   - PLAIN fixed-width scalars and length-prefixed byte arrays
//!   - The RLE/bit-packing hybrid behind booleans, levels and dictionary
//!     indices
//!   - Dictionary-index pages decoded through a per-chunk table
//!   - [`encoding::Decoder`]/[`encoding::Encoder`] capability traits with
//!     the delta family as named extension points
//!
//! - **Pages**: the self-delimited units of a chunk
//!   - [`page::PageBody`] makes "exactly one sub-header" a compile-time
//!     invariant
//!   - Headers travel in the Thrift compact protocol ([`thrift`])
//!   - [`writer::PageWriter`] serializes dictionary and v1/v2 data pages
//!
//! # Design Philosophy
//!
//! File-level metadata, schema resolution and block decompression are
//! collaborators, not residents: the scanner consumes a
//! [`metadata::ColumnChunkMetadata`] and [`metadata::ColumnDescriptor`]
//! resolved elsewhere, and hands compressed page bodies to a
//! [`metadata::Decompress`] implementation when one is attached. Codecs and
//! the page layer return errors to their caller; only the scanner makes
//! them sticky.

pub mod encoding;
pub mod error;
pub mod metadata;
pub mod page;
pub mod reader;
pub mod thrift;
pub mod value;
pub mod writer;

pub use encoding::{
    bit_width_from_max_int, Decoder, DecoderRegistry, DictionaryDecoder, DictionaryValues,
    Encoder, HybridDecoder, HybridEncoder, PlainDecoder, PlainEncoder,
};
pub use error::{ErrorContext, ParquetError, Result};
pub use metadata::{
    ColumnChunkMetadata, ColumnDescriptor, CompressionCodec, Decompress, Encoding, PageType,
    PhysicalType, Repetition,
};
pub use page::{
    read_page_header, write_page_header, DataPageHeader, DataPageHeaderV2, DictionaryPageHeader,
    PageBody, PageHeader,
};
pub use reader::ColumnScanner;
pub use value::{Levels, ValueBatch};
pub use writer::PageWriter;
