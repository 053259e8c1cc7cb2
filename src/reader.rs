//! Column-chunk scanning.
//!
//! A [`ColumnScanner`] owns a seekable byte source and one column chunk's
//! metadata, seeks to the chunk's data start on the first pull, and walks
//! the page sequence from there. Each successful pull decodes exactly one
//! data page; dictionary and index pages are consumed along the way. The
//! first real error is sticky and terminal; a clean end-of-stream at a page
//! boundary is ordinary termination, not a failure.

use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::encoding::rle::{decode_levels_v1, decode_levels_v2};
use crate::encoding::{DecoderRegistry, DictionaryDecoder, DictionaryValues};
use crate::metadata::{
    ColumnChunkMetadata, ColumnDescriptor, CompressionCodec, Decompress, Encoding,
};
use crate::page::{read_page_header, DataPageHeader, DataPageHeaderV2, PageBody, PageHeader};
use crate::value::{Levels, ValueBatch};
use crate::{ParquetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScannerState {
    Unstarted,
    ReadingPage,
    Done,
    Failed,
}

/// Pull-based reader over one column chunk
pub struct ColumnScanner<R: Read + Seek> {
    source: R,
    chunk: ColumnChunkMetadata,
    column: ColumnDescriptor,
    state: ScannerState,
    err: Option<ParquetError>,
    registry: DecoderRegistry,
    levels: Vec<Levels>,
    values: Option<ValueBatch>,
    consumed: u64,
    decompressor: Option<Box<dyn Decompress>>,
    observer: Option<Box<dyn FnMut(&PageHeader)>>,
}

impl<R: Read + Seek> ColumnScanner<R> {
    /// Create a scanner over one (source, column chunk) pair
    pub fn new(source: R, chunk: ColumnChunkMetadata, column: ColumnDescriptor) -> Self {
        ColumnScanner {
            source,
            chunk,
            column,
            state: ScannerState::Unstarted,
            err: None,
            registry: DecoderRegistry::new(),
            levels: Vec::new(),
            values: None,
            consumed: 0,
            decompressor: None,
            observer: None,
        }
    }

    /// Attach the decompression collaborator for non-uncompressed chunks
    pub fn with_decompressor(mut self, decompressor: impl Decompress + 'static) -> Self {
        self.decompressor = Some(Box::new(decompressor));
        self
    }

    /// Attach an observer invoked with every parsed page header
    pub fn with_observer(mut self, observer: impl FnMut(&PageHeader) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Pull the next data page. Returns `true` while a page was decoded and
    /// its levels/values are available; `false` on clean exhaustion or
    /// failure, distinguished through [`ColumnScanner::error`].
    pub fn advance(&mut self) -> bool {
        loop {
            match self.state {
                ScannerState::Done | ScannerState::Failed => return false,
                ScannerState::Unstarted => {
                    if self.chunk.data_page_offset < 0 {
                        self.fail(ParquetError::format("negative data page offset"));
                        return false;
                    }
                    let offset = self.chunk.data_page_offset as u64;
                    if let Err(e) = self.source.seek(SeekFrom::Start(offset)) {
                        self.fail(e.into());
                        return false;
                    }
                    self.state = ScannerState::ReadingPage;
                }
                ScannerState::ReadingPage => {
                    if self.chunk_exhausted() {
                        self.state = ScannerState::Done;
                        return false;
                    }
                    match self.next_page() {
                        Ok(true) => return true,
                        Ok(false) => continue,
                        Err(ParquetError::EndOfStream) => {
                            self.state = ScannerState::Done;
                            return false;
                        }
                        Err(e) => {
                            self.fail(e);
                            return false;
                        }
                    }
                }
            }
        }
    }

    /// The sticky error, if any. Empty once the chunk is exhausted cleanly.
    pub fn error(&self) -> Option<&ParquetError> {
        self.err.as_ref()
    }

    /// Level pairs for the current page's slots
    pub fn levels(&self) -> &[Levels] {
        &self.levels
    }

    /// The current page's decoded values
    pub fn values(&self) -> Option<&ValueBatch> {
        self.values.as_ref()
    }

    pub fn bools(&self) -> Option<&[bool]> {
        self.values.as_ref()?.as_bools()
    }

    pub fn int32s(&self) -> Option<&[i32]> {
        self.values.as_ref()?.as_int32s()
    }

    pub fn int64s(&self) -> Option<&[i64]> {
        self.values.as_ref()?.as_int64s()
    }

    pub fn float32s(&self) -> Option<&[f32]> {
        self.values.as_ref()?.as_float32s()
    }

    pub fn float64s(&self) -> Option<&[f64]> {
        self.values.as_ref()?.as_float64s()
    }

    pub fn byte_arrays(&self) -> Option<&[Bytes]> {
        self.values.as_ref()?.as_byte_arrays()
    }

    fn fail(&mut self, err: ParquetError) {
        // first real error wins
        if self.err.is_none() {
            self.err = Some(err);
        }
        self.levels.clear();
        self.values = None;
        self.state = ScannerState::Failed;
    }

    fn chunk_exhausted(&self) -> bool {
        self.chunk.total_compressed_size > 0
            && self.consumed >= self.chunk.total_compressed_size as u64
    }

    /// Interpret one page at the cursor. `Ok(true)` means a data page was
    /// decoded; `Ok(false)` a dictionary or index page was consumed.
    fn next_page(&mut self) -> Result<bool> {
        let header_start = self.source.stream_position()?;
        let header = read_page_header(&mut self.source)?;
        let header_len = self.source.stream_position()? - header_start;
        if let Some(observer) = self.observer.as_mut() {
            observer(&header);
        }

        let body_len = header.compressed_page_size as usize;
        let mut raw = vec![0u8; body_len];
        self.source.read_exact(&mut raw).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ParquetError::format("end of stream inside page body")
            } else {
                ParquetError::Io(e)
            }
        })?;
        self.consumed += header_len + body_len as u64;

        match header.body {
            PageBody::Dictionary(ref h) => {
                let body = self.decompress_body(raw, header.uncompressed_page_size)?;
                self.load_dictionary(h.num_values, body)?;
                Ok(false)
            }
            PageBody::Index => Ok(false),
            PageBody::Data(ref h) => {
                let body = self.decompress_body(raw, header.uncompressed_page_size)?;
                self.read_data_page(h, body)?;
                Ok(true)
            }
            PageBody::DataV2(ref h) => {
                let body = self.assemble_v2_body(h, raw, header.uncompressed_page_size)?;
                self.read_data_page_v2(h, body)?;
                Ok(true)
            }
        }
    }

    fn decompress_body(&mut self, raw: Vec<u8>, uncompressed_size: i32) -> Result<Bytes> {
        match self.chunk.codec {
            CompressionCodec::Uncompressed => Ok(Bytes::from(raw)),
            codec => {
                let expected = uncompressed_size as usize;
                let decompressor = self.decompressor.as_mut().ok_or_else(|| {
                    ParquetError::unsupported(format!(
                        "{:?} compression without a decompressor",
                        codec
                    ))
                })?;
                let out = decompressor.decompress(codec, &raw, expected)?;
                if out.len() != expected {
                    return Err(ParquetError::format(format!(
                        "decompressed to {} bytes, header declares {}",
                        out.len(),
                        expected
                    )));
                }
                Ok(Bytes::from(out))
            }
        }
    }

    /// v2 pages leave their level streams uncompressed; only the values
    /// section past them is handed to the collaborator
    fn assemble_v2_body(
        &mut self,
        h: &DataPageHeaderV2,
        raw: Vec<u8>,
        uncompressed_size: i32,
    ) -> Result<Bytes> {
        if self.chunk.codec == CompressionCodec::Uncompressed || !h.is_compressed {
            return Ok(Bytes::from(raw));
        }
        let levels_len = self.v2_levels_len(h)?;
        if levels_len > raw.len() {
            return Err(ParquetError::format("level byte lengths exceed page body"));
        }
        let values_len = (uncompressed_size as usize)
            .checked_sub(levels_len)
            .ok_or_else(|| ParquetError::format("level byte lengths exceed page size"))?;
        let codec = self.chunk.codec;
        let decompressor = self.decompressor.as_mut().ok_or_else(|| {
            ParquetError::unsupported(format!("{:?} compression without a decompressor", codec))
        })?;
        let values = decompressor.decompress(codec, &raw[levels_len..], values_len)?;
        if values.len() != values_len {
            return Err(ParquetError::format(format!(
                "decompressed to {} bytes, header declares {}",
                values.len(),
                values_len
            )));
        }
        let mut body = Vec::with_capacity(levels_len + values.len());
        body.extend_from_slice(&raw[..levels_len]);
        body.extend_from_slice(&values);
        Ok(Bytes::from(body))
    }

    fn v2_levels_len(&self, h: &DataPageHeaderV2) -> Result<usize> {
        if h.repetition_levels_byte_length < 0 || h.definition_levels_byte_length < 0 {
            return Err(ParquetError::format("negative level byte length"));
        }
        Ok(h.repetition_levels_byte_length as usize + h.definition_levels_byte_length as usize)
    }

    fn load_dictionary(&mut self, num_values: i32, body: Bytes) -> Result<()> {
        let num_values = usize::try_from(num_values)
            .map_err(|_| ParquetError::format("negative dictionary value count"))?;
        let dict = DictionaryValues::read(self.column.physical_type, body, num_values)?;
        self.registry.set_dictionary(DictionaryDecoder::new(dict))
    }

    fn read_data_page(&mut self, h: &DataPageHeader, body: Bytes) -> Result<()> {
        let num_values = usize::try_from(h.num_values)
            .map_err(|_| ParquetError::format("negative page value count"))?;
        let mut offset = 0usize;

        let rep = if self.column.max_repetition_level > 0 {
            if h.repetition_level_encoding != Encoding::Rle {
                return Err(ParquetError::unsupported(format!(
                    "{} repetition level encoding",
                    h.repetition_level_encoding.type_name()
                )));
            }
            let (levels, used) = decode_levels_v1(
                &body.slice(offset..),
                num_values,
                self.column.max_repetition_level,
            )?;
            offset += used;
            levels
        } else {
            vec![0u16; num_values]
        };

        let def = if self.column.max_definition_level > 0 {
            if h.definition_level_encoding != Encoding::Rle {
                return Err(ParquetError::unsupported(format!(
                    "{} definition level encoding",
                    h.definition_level_encoding.type_name()
                )));
            }
            let (levels, used) = decode_levels_v1(
                &body.slice(offset..),
                num_values,
                self.column.max_definition_level,
            )?;
            offset += used;
            levels
        } else {
            vec![self.column.max_definition_level; num_values]
        };

        self.decode_values(h.encoding, body.slice(offset..), &def, &rep, None)
    }

    fn read_data_page_v2(&mut self, h: &DataPageHeaderV2, body: Bytes) -> Result<()> {
        let num_values = usize::try_from(h.num_values)
            .map_err(|_| ParquetError::format("negative page value count"))?;
        let num_nulls = usize::try_from(h.num_nulls)
            .map_err(|_| ParquetError::format("negative page null count"))?;
        if num_nulls > num_values {
            return Err(ParquetError::format("null count exceeds value count"));
        }
        let levels_len = self.v2_levels_len(h)?;
        if levels_len > body.len() {
            return Err(ParquetError::format("level byte lengths exceed page body"));
        }
        let rep_len = h.repetition_levels_byte_length as usize;
        let def_len = h.definition_levels_byte_length as usize;

        let rep = if self.column.max_repetition_level > 0 {
            decode_levels_v2(
                body.slice(..rep_len),
                num_values,
                self.column.max_repetition_level,
            )?
        } else {
            if rep_len != 0 {
                return Err(ParquetError::format(
                    "repetition levels on a non-repeated column",
                ));
            }
            vec![0u16; num_values]
        };

        let def = if self.column.max_definition_level > 0 {
            decode_levels_v2(
                body.slice(rep_len..rep_len + def_len),
                num_values,
                self.column.max_definition_level,
            )?
        } else {
            if def_len != 0 {
                return Err(ParquetError::format(
                    "definition levels on a required column",
                ));
            }
            if num_nulls != 0 {
                return Err(ParquetError::format("null count on a required column"));
            }
            vec![self.column.max_definition_level; num_values]
        };

        let non_null = num_values - num_nulls;
        self.decode_values(
            h.encoding,
            body.slice(levels_len..),
            &def,
            &rep,
            Some(non_null),
        )
    }

    fn decode_values(
        &mut self,
        encoding: Encoding,
        values: Bytes,
        def: &[u16],
        rep: &[u16],
        declared_non_null: Option<usize>,
    ) -> Result<()> {
        let max_def = self.column.max_definition_level;
        let non_null = if max_def > 0 {
            def.iter().filter(|&&d| d == max_def).count()
        } else {
            def.len()
        };
        if let Some(declared) = declared_non_null {
            if declared != non_null {
                return Err(ParquetError::format(format!(
                    "header declares {} present values, levels hold {}",
                    declared, non_null
                )));
            }
        }

        let physical_type = self.column.physical_type;
        let decoder = self.registry.decoder_for(encoding)?;
        decoder.set_data(values, non_null)?;
        let batch = ValueBatch::decode(decoder, physical_type, non_null)?;

        self.levels = def
            .iter()
            .zip(rep.iter())
            .map(|(&d, &r)| Levels { d, r })
            .collect();
        self.values = Some(batch);
        Ok(())
    }
}
