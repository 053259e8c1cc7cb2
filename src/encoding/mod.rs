//! Value encodings and the capability interfaces they implement.
//!
//! Each encoding provides a [`Decoder`] bound per page to the page's value
//! bytes and declared count. Plain is implemented today; dictionary-index
//! pages decode through a [`DictionaryDecoder`] persisted across the pages
//! of a chunk; the delta family is a named extension point and fails as
//! unsupported.

pub mod dictionary;
pub mod plain;
pub mod rle;

pub use dictionary::{DictionaryDecoder, DictionaryValues};
pub use plain::{PlainDecoder, PlainEncoder};
pub use rle::{bit_width_from_max_int, HybridDecoder, HybridEncoder};

use bytes::Bytes;
use indexmap::IndexMap;

use crate::metadata::Encoding;
use crate::{ParquetError, Result};

/// Per-encoding decode capability.
///
/// A decoder is rebound to each page via `set_data` and exposes one decode
/// operation per physical type. Every operation decodes
/// `min(remaining, out.len())` values, advances the source exactly that many
/// values' worth of bytes, and returns the count decoded; a source that runs
/// dry first fails with [`ParquetError::ShortRead`] naming the count that
/// was decoded.
pub trait Decoder {
    /// Bind the decoder to one page's value bytes and declared value count
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()>;

    fn decode_bool(&mut self, out: &mut [bool]) -> Result<usize>;
    fn decode_int32(&mut self, out: &mut [i32]) -> Result<usize>;
    fn decode_int64(&mut self, out: &mut [i64]) -> Result<usize>;
    fn decode_float32(&mut self, out: &mut [f32]) -> Result<usize>;
    fn decode_float64(&mut self, out: &mut [f64]) -> Result<usize>;
    fn decode_byte_array(&mut self, out: &mut [Bytes]) -> Result<usize>;
}

/// Per-encoding encode capability.
///
/// An encoder accumulates one page's worth of values and a running count;
/// `flush` finalizes the page body.
pub trait Encoder {
    fn write_bool(&mut self, values: &[bool]) -> Result<()>;
    fn write_int32(&mut self, values: &[i32]) -> Result<()>;
    fn write_int64(&mut self, values: &[i64]) -> Result<()>;
    fn write_float32(&mut self, values: &[f32]) -> Result<()>;
    fn write_float64(&mut self, values: &[f64]) -> Result<()>;
    fn write_byte_array(&mut self, values: &[Bytes]) -> Result<()>;

    /// Values written since creation or the last flush
    fn num_values(&self) -> usize;

    /// The encoding tag to declare in the page header
    fn encoding(&self) -> Encoding;

    /// Finalize and return the page body, resetting the encoder
    fn flush(&mut self) -> Result<Bytes>;
}

/// Per-chunk decoder cache keyed on the encoding tag.
///
/// Plain decoders are constructed lazily on first use; the dictionary
/// decoder is installed once when the chunk's dictionary page is read and
/// serves every dictionary-index encoding thereafter.
pub struct DecoderRegistry {
    decoders: IndexMap<Encoding, Box<dyn Decoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        DecoderRegistry {
            decoders: IndexMap::new(),
        }
    }

    /// Whether a dictionary page has been installed for this chunk
    pub fn has_dictionary(&self) -> bool {
        self.decoders.contains_key(&Encoding::RleDictionary)
    }

    /// Install the chunk's dictionary decoder. A chunk may have at most one
    /// dictionary page.
    pub fn set_dictionary(&mut self, decoder: DictionaryDecoder) -> Result<()> {
        if self.has_dictionary() {
            return Err(ParquetError::format(
                "column chunk with more than one dictionary page",
            ));
        }
        self.decoders
            .insert(Encoding::RleDictionary, Box::new(decoder));
        Ok(())
    }

    /// Decoder for a data page's value encoding, constructing it on first
    /// use where the encoding allows
    pub fn decoder_for(&mut self, encoding: Encoding) -> Result<&mut (dyn Decoder + '_)> {
        let key = if encoding.is_dictionary_index() {
            Encoding::RleDictionary
        } else {
            encoding
        };
        match key {
            Encoding::Plain => Ok(self
                .decoders
                .entry(Encoding::Plain)
                .or_insert_with(|| Box::new(PlainDecoder::new()))
                .as_mut()),
            Encoding::RleDictionary => self
                .decoders
                .get_mut(&Encoding::RleDictionary)
                .map(|d| &mut **d as &mut dyn Decoder)
                .ok_or_else(|| {
                    ParquetError::format("dictionary page must come before data pages")
                }),
            Encoding::DeltaBinaryPacked
            | Encoding::DeltaLengthByteArray
            | Encoding::DeltaByteArray => Err(ParquetError::unsupported(format!(
                "{} encoding",
                key.type_name()
            ))),
            other => Err(ParquetError::unsupported(format!(
                "{} value encoding",
                other.type_name()
            ))),
        }
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
