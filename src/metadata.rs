//! Metadata consumed by the column-chunk layer.
//!
//! These types mirror the file-level structures the metadata collaborator
//! decodes at file-open time. This crate only reads them; it never produces
//! row-group or file metadata of its own.

use crate::Result;

/// Physical storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

impl PhysicalType {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(PhysicalType::Boolean),
            1 => Some(PhysicalType::Int32),
            2 => Some(PhysicalType::Int64),
            3 => Some(PhysicalType::Int96),
            4 => Some(PhysicalType::Float),
            5 => Some(PhysicalType::Double),
            6 => Some(PhysicalType::ByteArray),
            7 => Some(PhysicalType::FixedLenByteArray),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            PhysicalType::Boolean => 0,
            PhysicalType::Int32 => 1,
            PhysicalType::Int64 => 2,
            PhysicalType::Int96 => 3,
            PhysicalType::Float => 4,
            PhysicalType::Double => 5,
            PhysicalType::ByteArray => 6,
            PhysicalType::FixedLenByteArray => 7,
        }
    }

    /// Get the type name for display
    pub fn type_name(&self) -> &'static str {
        match self {
            PhysicalType::Boolean => "BOOLEAN",
            PhysicalType::Int32 => "INT32",
            PhysicalType::Int64 => "INT64",
            PhysicalType::Int96 => "INT96",
            PhysicalType::Float => "FLOAT",
            PhysicalType::Double => "DOUBLE",
            PhysicalType::ByteArray => "BYTE_ARRAY",
            PhysicalType::FixedLenByteArray => "FIXED_LEN_BYTE_ARRAY",
        }
    }
}

/// Value and level encodings defined by the format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Plain,
    PlainDictionary,
    Rle,
    BitPacked,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    RleDictionary,
    ByteStreamSplit,
}

impl Encoding {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Encoding::Plain),
            2 => Some(Encoding::PlainDictionary),
            3 => Some(Encoding::Rle),
            4 => Some(Encoding::BitPacked),
            5 => Some(Encoding::DeltaBinaryPacked),
            6 => Some(Encoding::DeltaLengthByteArray),
            7 => Some(Encoding::DeltaByteArray),
            8 => Some(Encoding::RleDictionary),
            9 => Some(Encoding::ByteStreamSplit),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Encoding::Plain => 0,
            Encoding::PlainDictionary => 2,
            Encoding::Rle => 3,
            Encoding::BitPacked => 4,
            Encoding::DeltaBinaryPacked => 5,
            Encoding::DeltaLengthByteArray => 6,
            Encoding::DeltaByteArray => 7,
            Encoding::RleDictionary => 8,
            Encoding::ByteStreamSplit => 9,
        }
    }

    /// Whether pages with this encoding store dictionary indices
    pub fn is_dictionary_index(self) -> bool {
        matches!(self, Encoding::PlainDictionary | Encoding::RleDictionary)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Encoding::Plain => "PLAIN",
            Encoding::PlainDictionary => "PLAIN_DICTIONARY",
            Encoding::Rle => "RLE",
            Encoding::BitPacked => "BIT_PACKED",
            Encoding::DeltaBinaryPacked => "DELTA_BINARY_PACKED",
            Encoding::DeltaLengthByteArray => "DELTA_LENGTH_BYTE_ARRAY",
            Encoding::DeltaByteArray => "DELTA_BYTE_ARRAY",
            Encoding::RleDictionary => "RLE_DICTIONARY",
            Encoding::ByteStreamSplit => "BYTE_STREAM_SPLIT",
        }
    }
}

/// Page discriminator carried in every page header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    DataPage,
    IndexPage,
    DictionaryPage,
    DataPageV2,
}

impl PageType {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(PageType::DataPage),
            1 => Some(PageType::IndexPage),
            2 => Some(PageType::DictionaryPage),
            3 => Some(PageType::DataPageV2),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            PageType::DataPage => 0,
            PageType::IndexPage => 1,
            PageType::DictionaryPage => 2,
            PageType::DataPageV2 => 3,
        }
    }
}

/// Represents how values are repeated in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// Field must have exactly one value
    Required,
    /// Field can have 0 or 1 value
    Optional,
    /// Field can have 0 or more values
    Repeated,
}

impl Repetition {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Repetition::Required),
            1 => Some(Repetition::Optional),
            2 => Some(Repetition::Repeated),
            _ => None,
        }
    }
}

/// Block compression applied to page bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionCodec {
    Uncompressed,
    Snappy,
    Gzip,
    Lzo,
    Brotli,
    Lz4,
    Zstd,
}

impl CompressionCodec {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(CompressionCodec::Uncompressed),
            1 => Some(CompressionCodec::Snappy),
            2 => Some(CompressionCodec::Gzip),
            3 => Some(CompressionCodec::Lzo),
            4 => Some(CompressionCodec::Brotli),
            5 => Some(CompressionCodec::Lz4),
            6 => Some(CompressionCodec::Zstd),
            _ => None,
        }
    }
}

/// Decompression collaborator.
///
/// Page bodies are handed to this seam together with the chunk's codec tag
/// and the uncompressed length the page header declares. Without a
/// collaborator the scanner handles `Uncompressed` chunks only.
pub trait Decompress {
    fn decompress(
        &mut self,
        codec: CompressionCodec,
        input: &[u8],
        uncompressed_len: usize,
    ) -> Result<Vec<u8>>;
}

/// Per-column slice of the row-group metadata, as supplied by the metadata
/// collaborator. The scanner only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMetadata {
    pub physical_type: PhysicalType,
    pub encodings: Vec<Encoding>,
    pub path_in_schema: Vec<String>,
    pub codec: CompressionCodec,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    /// Byte offset where page data begins (a dictionary page, if the chunk
    /// has one, sits first)
    pub data_page_offset: i64,
    pub dictionary_page_offset: Option<i64>,
}

/// Resolved schema information for one column: its path, physical type and
/// the maximum definition/repetition levels derived from the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub path_in_schema: Vec<String>,
    pub physical_type: PhysicalType,
    pub max_definition_level: u16,
    pub max_repetition_level: u16,
}

impl ColumnDescriptor {
    /// Descriptor for a flat (non-nested) column with the given repetition
    pub fn new<S: Into<String>>(
        name: S,
        physical_type: PhysicalType,
        repetition: Repetition,
    ) -> Self {
        let (max_d, max_r) = match repetition {
            Repetition::Required => (0, 0),
            Repetition::Optional => (1, 0),
            Repetition::Repeated => (1, 1),
        };
        ColumnDescriptor {
            path_in_schema: vec![name.into()],
            physical_type,
            max_definition_level: max_d,
            max_repetition_level: max_r,
        }
    }

    /// Descriptor with explicit maximum levels, for nested paths resolved by
    /// the schema collaborator
    pub fn with_levels(
        path_in_schema: Vec<String>,
        physical_type: PhysicalType,
        max_definition_level: u16,
        max_repetition_level: u16,
    ) -> Self {
        ColumnDescriptor {
            path_in_schema,
            physical_type,
            max_definition_level,
            max_repetition_level,
        }
    }

    pub fn path(&self) -> String {
        self.path_in_schema.join(".")
    }
}
