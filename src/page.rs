//! Page-header model and its compact-protocol wire form.
//!
//! A page header is discriminated by its page type and carries exactly one
//! type-specific sub-header. [`PageBody`] makes that a compile-time
//! invariant; a wire-level mismatch between the declared type and the
//! populated sub-header field is a format error at parse time.

use crate::metadata::{Encoding, PageType};
use crate::thrift::{CompactReader, CompactWriter};
use crate::{ParquetError, Result};
use std::io::{Read, Write};

/// Header common to every page
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    pub uncompressed_page_size: i32,
    pub compressed_page_size: i32,
    /// CRC of the page body; carried, not verified by this layer
    pub crc: Option<i32>,
    pub body: PageBody,
}

/// The type-specific sub-header, exactly one per page
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    Data(DataPageHeader),
    DataV2(DataPageHeaderV2),
    Dictionary(DictionaryPageHeader),
    Index,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub definition_level_encoding: Encoding,
    pub repetition_level_encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: Encoding,
    pub definition_levels_byte_length: i32,
    pub repetition_levels_byte_length: i32,
    pub is_compressed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub is_sorted: bool,
}

impl PageHeader {
    pub fn page_type(&self) -> PageType {
        match self.body {
            PageBody::Data(_) => PageType::DataPage,
            PageBody::DataV2(_) => PageType::DataPageV2,
            PageBody::Dictionary(_) => PageType::DictionaryPage,
            PageBody::Index => PageType::IndexPage,
        }
    }

    /// Declared value count, for page types that carry one
    pub fn num_values(&self) -> Option<i32> {
        match &self.body {
            PageBody::Data(h) => Some(h.num_values),
            PageBody::DataV2(h) => Some(h.num_values),
            PageBody::Dictionary(h) => Some(h.num_values),
            PageBody::Index => None,
        }
    }
}

/// Observer invoked with every parsed page header, the seam for per-page
/// tracing
pub type PageObserver<'a> = dyn FnMut(&PageHeader) + 'a;

fn read_encoding<R: Read>(r: &mut CompactReader<R>) -> Result<Encoding> {
    let v = r.read_i32()?;
    Encoding::from_i32(v).ok_or_else(|| ParquetError::format(format!("unknown encoding value {}", v)))
}

fn read_data_page_header<R: Read>(r: &mut CompactReader<R>) -> Result<DataPageHeader> {
    r.struct_begin();
    let mut num_values = None;
    let mut encoding = None;
    let mut def_encoding = None;
    let mut rep_encoding = None;
    while let Some((tpe, id)) = r.read_field()? {
        match id {
            1 => num_values = Some(r.read_i32()?),
            2 => encoding = Some(read_encoding(r)?),
            3 => def_encoding = Some(read_encoding(r)?),
            4 => rep_encoding = Some(read_encoding(r)?),
            _ => r.skip_field(tpe)?,
        }
    }
    r.struct_end()?;
    Ok(DataPageHeader {
        num_values: num_values
            .ok_or_else(|| ParquetError::format("data page header missing num_values"))?,
        encoding: encoding.ok_or_else(|| ParquetError::format("data page header missing encoding"))?,
        definition_level_encoding: def_encoding
            .ok_or_else(|| ParquetError::format("data page header missing definition_level_encoding"))?,
        repetition_level_encoding: rep_encoding
            .ok_or_else(|| ParquetError::format("data page header missing repetition_level_encoding"))?,
    })
}

fn read_data_page_header_v2<R: Read>(r: &mut CompactReader<R>) -> Result<DataPageHeaderV2> {
    r.struct_begin();
    let mut num_values = None;
    let mut num_nulls = None;
    let mut num_rows = None;
    let mut encoding = None;
    let mut def_len = None;
    let mut rep_len = None;
    let mut is_compressed = true;
    while let Some((tpe, id)) = r.read_field()? {
        match id {
            1 => num_values = Some(r.read_i32()?),
            2 => num_nulls = Some(r.read_i32()?),
            3 => num_rows = Some(r.read_i32()?),
            4 => encoding = Some(read_encoding(r)?),
            5 => def_len = Some(r.read_i32()?),
            6 => rep_len = Some(r.read_i32()?),
            7 => is_compressed = r.read_bool()?,
            _ => r.skip_field(tpe)?,
        }
    }
    r.struct_end()?;
    Ok(DataPageHeaderV2 {
        num_values: num_values
            .ok_or_else(|| ParquetError::format("data page header v2 missing num_values"))?,
        num_nulls: num_nulls
            .ok_or_else(|| ParquetError::format("data page header v2 missing num_nulls"))?,
        num_rows: num_rows
            .ok_or_else(|| ParquetError::format("data page header v2 missing num_rows"))?,
        encoding: encoding
            .ok_or_else(|| ParquetError::format("data page header v2 missing encoding"))?,
        definition_levels_byte_length: def_len
            .ok_or_else(|| ParquetError::format("data page header v2 missing definition_levels_byte_length"))?,
        repetition_levels_byte_length: rep_len
            .ok_or_else(|| ParquetError::format("data page header v2 missing repetition_levels_byte_length"))?,
        is_compressed,
    })
}

fn read_dictionary_page_header<R: Read>(r: &mut CompactReader<R>) -> Result<DictionaryPageHeader> {
    r.struct_begin();
    let mut num_values = None;
    let mut encoding = None;
    let mut is_sorted = false;
    while let Some((tpe, id)) = r.read_field()? {
        match id {
            1 => num_values = Some(r.read_i32()?),
            2 => encoding = Some(read_encoding(r)?),
            3 => is_sorted = r.read_bool()?,
            _ => r.skip_field(tpe)?,
        }
    }
    r.struct_end()?;
    Ok(DictionaryPageHeader {
        num_values: num_values
            .ok_or_else(|| ParquetError::format("dictionary page header missing num_values"))?,
        encoding: encoding
            .ok_or_else(|| ParquetError::format("dictionary page header missing encoding"))?,
        is_sorted,
    })
}

fn read_index_page_header<R: Read>(r: &mut CompactReader<R>) -> Result<()> {
    r.struct_begin();
    while let Some((tpe, _)) = r.read_field()? {
        r.skip_field(tpe)?;
    }
    r.struct_end()
}

/// Parse one page header at the reader's position.
///
/// A clean end-of-stream before the first header byte is reported as
/// [`ParquetError::EndOfStream`]; running dry anywhere inside the header is a
/// format error.
pub fn read_page_header<R: Read>(source: R) -> Result<PageHeader> {
    let mut r = CompactReader::new(source);
    let result = read_page_header_fields(&mut r);
    match result {
        Ok(header) => Ok(header),
        Err(ParquetError::Io(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            if r.bytes_read() == 0 {
                Err(ParquetError::EndOfStream)
            } else {
                Err(ParquetError::format("page header truncated"))
            }
        }
        Err(e) => Err(e),
    }
}

fn read_page_header_fields<R: Read>(r: &mut CompactReader<R>) -> Result<PageHeader> {
    r.struct_begin();
    let mut page_type_raw = None;
    let mut uncompressed = None;
    let mut compressed = None;
    let mut crc = None;
    let mut data = None;
    let mut index = false;
    let mut dictionary = None;
    let mut data_v2 = None;

    while let Some((tpe, id)) = r.read_field()? {
        match id {
            1 => page_type_raw = Some(r.read_i32()?),
            2 => uncompressed = Some(r.read_i32()?),
            3 => compressed = Some(r.read_i32()?),
            4 => crc = Some(r.read_i32()?),
            5 => data = Some(read_data_page_header(r)?),
            6 => {
                read_index_page_header(r)?;
                index = true;
            }
            7 => dictionary = Some(read_dictionary_page_header(r)?),
            8 => data_v2 = Some(read_data_page_header_v2(r)?),
            _ => r.skip_field(tpe)?,
        }
    }
    r.struct_end()?;

    let raw = page_type_raw.ok_or_else(|| ParquetError::format("page header missing type"))?;
    let page_type = PageType::from_i32(raw)
        .ok_or_else(|| ParquetError::unsupported(format!("page type {}", raw)))?;

    let populated =
        data.is_some() as u8 + data_v2.is_some() as u8 + dictionary.is_some() as u8 + index as u8;
    if populated > 1 {
        return Err(ParquetError::format(
            "page header with more than one sub-header",
        ));
    }

    let body = match page_type {
        PageType::DataPage => PageBody::Data(data.ok_or_else(|| {
            ParquetError::format("DATA_PAGE header without data_page_header")
        })?),
        PageType::DataPageV2 => PageBody::DataV2(data_v2.ok_or_else(|| {
            ParquetError::format("DATA_PAGE_V2 header without data_page_header_v2")
        })?),
        PageType::DictionaryPage => PageBody::Dictionary(dictionary.ok_or_else(|| {
            ParquetError::format("DICTIONARY_PAGE header without dictionary_page_header")
        })?),
        PageType::IndexPage => {
            if !index {
                return Err(ParquetError::format(
                    "INDEX_PAGE header without index_page_header",
                ));
            }
            PageBody::Index
        }
    };

    let uncompressed = uncompressed
        .ok_or_else(|| ParquetError::format("page header missing uncompressed_page_size"))?;
    let compressed = compressed
        .ok_or_else(|| ParquetError::format("page header missing compressed_page_size"))?;
    if compressed < 0 || uncompressed < 0 {
        return Err(ParquetError::format("negative page size"));
    }

    Ok(PageHeader {
        uncompressed_page_size: uncompressed,
        compressed_page_size: compressed,
        crc,
        body,
    })
}

/// Serialize one page header in its compact-protocol wire form
pub fn write_page_header<W: Write>(sink: W, header: &PageHeader) -> Result<()> {
    let mut w = CompactWriter::new(sink);
    w.struct_begin();
    w.write_i32_field(1, header.page_type().as_i32())?;
    w.write_i32_field(2, header.uncompressed_page_size)?;
    w.write_i32_field(3, header.compressed_page_size)?;
    if let Some(crc) = header.crc {
        w.write_i32_field(4, crc)?;
    }
    match &header.body {
        PageBody::Data(h) => {
            w.write_struct_field_begin(5)?;
            w.write_i32_field(1, h.num_values)?;
            w.write_i32_field(2, h.encoding.as_i32())?;
            w.write_i32_field(3, h.definition_level_encoding.as_i32())?;
            w.write_i32_field(4, h.repetition_level_encoding.as_i32())?;
            w.struct_end()?;
        }
        PageBody::Index => {
            w.write_struct_field_begin(6)?;
            w.struct_end()?;
        }
        PageBody::Dictionary(h) => {
            w.write_struct_field_begin(7)?;
            w.write_i32_field(1, h.num_values)?;
            w.write_i32_field(2, h.encoding.as_i32())?;
            if h.is_sorted {
                w.write_bool_field(3, true)?;
            }
            w.struct_end()?;
        }
        PageBody::DataV2(h) => {
            w.write_struct_field_begin(8)?;
            w.write_i32_field(1, h.num_values)?;
            w.write_i32_field(2, h.num_nulls)?;
            w.write_i32_field(3, h.num_rows)?;
            w.write_i32_field(4, h.encoding.as_i32())?;
            w.write_i32_field(5, h.definition_levels_byte_length)?;
            w.write_i32_field(6, h.repetition_levels_byte_length)?;
            w.write_bool_field(7, h.is_compressed)?;
            w.struct_end()?;
        }
    }
    w.struct_end()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thrift::CompactWriter;
    use std::io::Cursor;

    fn roundtrip(header: &PageHeader) -> PageHeader {
        let mut buf = Vec::new();
        write_page_header(&mut buf, header).unwrap();
        read_page_header(Cursor::new(buf)).unwrap()
    }

    #[test]
    fn test_data_page_roundtrip() {
        let header = PageHeader {
            uncompressed_page_size: 128,
            compressed_page_size: 128,
            crc: None,
            body: PageBody::Data(DataPageHeader {
                num_values: 10,
                encoding: Encoding::Plain,
                definition_level_encoding: Encoding::Rle,
                repetition_level_encoding: Encoding::Rle,
            }),
        };
        assert_eq!(roundtrip(&header), header);
    }

    #[test]
    fn test_data_page_v2_roundtrip() {
        let header = PageHeader {
            uncompressed_page_size: 64,
            compressed_page_size: 64,
            crc: Some(0x1234_5678),
            body: PageBody::DataV2(DataPageHeaderV2 {
                num_values: 9,
                num_nulls: 2,
                num_rows: 7,
                encoding: Encoding::Plain,
                definition_levels_byte_length: 6,
                repetition_levels_byte_length: 0,
                is_compressed: false,
            }),
        };
        assert_eq!(roundtrip(&header), header);
    }

    #[test]
    fn test_dictionary_page_roundtrip() {
        let header = PageHeader {
            uncompressed_page_size: 40,
            compressed_page_size: 40,
            crc: None,
            body: PageBody::Dictionary(DictionaryPageHeader {
                num_values: 4,
                encoding: Encoding::Plain,
                is_sorted: true,
            }),
        };
        assert_eq!(roundtrip(&header), header);
    }

    #[test]
    fn test_index_page_roundtrip() {
        let header = PageHeader {
            uncompressed_page_size: 0,
            compressed_page_size: 0,
            crc: None,
            body: PageBody::Index,
        };
        assert_eq!(roundtrip(&header), header);
        assert_eq!(header.page_type(), PageType::IndexPage);
        assert_eq!(header.num_values(), None);
    }

    #[test]
    fn test_type_sub_header_mismatch() {
        // declared DICTIONARY_PAGE but carrying a data-page sub-header
        let mut w = CompactWriter::new(Vec::new());
        w.struct_begin();
        w.write_i32_field(1, PageType::DictionaryPage.as_i32()).unwrap();
        w.write_i32_field(2, 16).unwrap();
        w.write_i32_field(3, 16).unwrap();
        w.write_struct_field_begin(5).unwrap();
        w.write_i32_field(1, 3).unwrap();
        w.write_i32_field(2, 0).unwrap();
        w.write_i32_field(3, 3).unwrap();
        w.write_i32_field(4, 3).unwrap();
        w.struct_end().unwrap();
        w.struct_end().unwrap();
        let buf = w.into_inner();

        let err = read_page_header(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_unknown_page_type() {
        let mut w = CompactWriter::new(Vec::new());
        w.struct_begin();
        w.write_i32_field(1, 99).unwrap();
        w.write_i32_field(2, 0).unwrap();
        w.write_i32_field(3, 0).unwrap();
        w.struct_end().unwrap();
        let buf = w.into_inner();

        let err = read_page_header(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ParquetError::Unsupported(_)));
    }

    #[test]
    fn test_empty_source_is_end_of_stream() {
        let err = read_page_header(Cursor::new(Vec::<u8>::new())).unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn test_truncated_header_is_format_error() {
        let header = PageHeader {
            uncompressed_page_size: 8,
            compressed_page_size: 8,
            crc: None,
            body: PageBody::Data(DataPageHeader {
                num_values: 2,
                encoding: Encoding::Plain,
                definition_level_encoding: Encoding::Rle,
                repetition_level_encoding: Encoding::Rle,
            }),
        };
        let mut buf = Vec::new();
        write_page_header(&mut buf, &header).unwrap();
        buf.truncate(buf.len() / 2);

        let err = read_page_header(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_statistics_field_is_skipped() {
        // a header with an unknown struct field (statistics, id 5 in the
        // sub-header) still parses
        let mut w = CompactWriter::new(Vec::new());
        w.struct_begin();
        w.write_i32_field(1, PageType::DataPage.as_i32()).unwrap();
        w.write_i32_field(2, 4).unwrap();
        w.write_i32_field(3, 4).unwrap();
        w.write_struct_field_begin(5).unwrap();
        w.write_i32_field(1, 1).unwrap();
        w.write_i32_field(2, 0).unwrap();
        w.write_i32_field(3, 3).unwrap();
        w.write_i32_field(4, 3).unwrap();
        // statistics struct with binary min/max
        w.write_struct_field_begin(5).unwrap();
        w.write_binary_field(1, &[1, 0, 0, 0]).unwrap();
        w.write_binary_field(2, &[9, 0, 0, 0]).unwrap();
        w.write_i64_field(3, 0).unwrap();
        w.struct_end().unwrap();
        w.struct_end().unwrap();
        w.struct_end().unwrap();
        let buf = w.into_inner();

        let header = read_page_header(Cursor::new(buf)).unwrap();
        assert_eq!(header.page_type(), PageType::DataPage);
        assert_eq!(header.num_values(), Some(1));
    }
}
