//! Page serialization: the write-side counterpart of the scanner, short of
//! row-group assembly.
//!
//! A [`PageWriter`] appends self-delimited pages to any `io::Write` sink.
//! Callers encode values through an [`crate::encoding::Encoder`] and hand the
//! finished body over together with the per-slot levels; level streams and
//! headers are assembled here.

use std::io::Write;

use crate::encoding::rle::{encode_levels_v1, encode_levels_v2};
use crate::metadata::{ColumnDescriptor, Encoding};
use crate::page::{
    write_page_header, DataPageHeader, DataPageHeaderV2, DictionaryPageHeader, PageBody, PageHeader,
};
use crate::value::Levels;
use crate::{ParquetError, Result};

/// Writes dictionary and data pages to a sink
pub struct PageWriter<W: Write> {
    sink: W,
    pages_written: usize,
}

impl<W: Write> PageWriter<W> {
    pub fn new(sink: W) -> Self {
        PageWriter {
            sink,
            pages_written: 0,
        }
    }

    pub fn pages_written(&self) -> usize {
        self.pages_written
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Write a header and its body verbatim. The header's declared
    /// compressed size must match the body.
    pub fn write_page(&mut self, header: &PageHeader, body: &[u8]) -> Result<()> {
        if header.compressed_page_size as usize != body.len() {
            return Err(ParquetError::format(format!(
                "page body is {} bytes, header declares {}",
                body.len(),
                header.compressed_page_size
            )));
        }
        write_page_header(&mut self.sink, header)?;
        self.sink.write_all(body)?;
        self.pages_written += 1;
        Ok(())
    }

    /// Write the chunk's dictionary page from plain-encoded values
    pub fn write_dictionary_page(&mut self, num_values: usize, values: &[u8]) -> Result<()> {
        let header = PageHeader {
            uncompressed_page_size: values.len() as i32,
            compressed_page_size: values.len() as i32,
            crc: None,
            body: PageBody::Dictionary(DictionaryPageHeader {
                num_values: num_values as i32,
                encoding: Encoding::Plain,
                is_sorted: false,
            }),
        };
        self.write_page(&header, values)
    }

    /// Write a v1 data page: length-prefixed level streams, then the encoded
    /// values
    pub fn write_data_page(
        &mut self,
        column: &ColumnDescriptor,
        encoding: Encoding,
        num_values: usize,
        levels: Option<&[Levels]>,
        values: &[u8],
    ) -> Result<()> {
        let mut body = Vec::new();
        self.check_levels(column, num_values, levels)?;
        if column.max_repetition_level > 0 {
            let rep: Vec<u16> = levels.unwrap().iter().map(|l| l.r).collect();
            body.extend_from_slice(&encode_levels_v1(&rep, column.max_repetition_level)?);
        }
        if column.max_definition_level > 0 {
            let def: Vec<u16> = levels.unwrap().iter().map(|l| l.d).collect();
            body.extend_from_slice(&encode_levels_v1(&def, column.max_definition_level)?);
        }
        body.extend_from_slice(values);

        let header = PageHeader {
            uncompressed_page_size: body.len() as i32,
            compressed_page_size: body.len() as i32,
            crc: None,
            body: PageBody::Data(DataPageHeader {
                num_values: num_values as i32,
                encoding,
                definition_level_encoding: Encoding::Rle,
                repetition_level_encoding: Encoding::Rle,
            }),
        };
        self.write_page(&header, &body)
    }

    /// Write a v2 data page: raw level streams with their byte lengths in
    /// the header, then the encoded values
    pub fn write_data_page_v2(
        &mut self,
        column: &ColumnDescriptor,
        encoding: Encoding,
        num_values: usize,
        levels: Option<&[Levels]>,
        values: &[u8],
    ) -> Result<()> {
        self.check_levels(column, num_values, levels)?;
        let rep_bytes = if column.max_repetition_level > 0 {
            let rep: Vec<u16> = levels.unwrap().iter().map(|l| l.r).collect();
            encode_levels_v2(&rep, column.max_repetition_level)?
        } else {
            Vec::new()
        };
        let def_bytes = if column.max_definition_level > 0 {
            let def: Vec<u16> = levels.unwrap().iter().map(|l| l.d).collect();
            encode_levels_v2(&def, column.max_definition_level)?
        } else {
            Vec::new()
        };

        let num_nulls = match levels {
            Some(levels) => levels
                .iter()
                .filter(|l| l.d < column.max_definition_level)
                .count(),
            None => 0,
        };
        let num_rows = match levels {
            Some(levels) if column.max_repetition_level > 0 => {
                levels.iter().filter(|l| l.r == 0).count()
            }
            _ => num_values,
        };

        let mut body = Vec::with_capacity(rep_bytes.len() + def_bytes.len() + values.len());
        body.extend_from_slice(&rep_bytes);
        body.extend_from_slice(&def_bytes);
        body.extend_from_slice(values);

        let header = PageHeader {
            uncompressed_page_size: body.len() as i32,
            compressed_page_size: body.len() as i32,
            crc: None,
            body: PageBody::DataV2(DataPageHeaderV2 {
                num_values: num_values as i32,
                num_nulls: num_nulls as i32,
                num_rows: num_rows as i32,
                encoding,
                definition_levels_byte_length: def_bytes.len() as i32,
                repetition_levels_byte_length: rep_bytes.len() as i32,
                is_compressed: false,
            }),
        };
        self.write_page(&header, &body)
    }

    /// Write an index page. The scanner recognizes and skips these.
    pub fn write_index_page(&mut self, body: &[u8]) -> Result<()> {
        let header = PageHeader {
            uncompressed_page_size: body.len() as i32,
            compressed_page_size: body.len() as i32,
            crc: None,
            body: PageBody::Index,
        };
        self.write_page(&header, body)
    }

    fn check_levels(
        &self,
        column: &ColumnDescriptor,
        num_values: usize,
        levels: Option<&[Levels]>,
    ) -> Result<()> {
        if column.max_definition_level > 0 || column.max_repetition_level > 0 {
            match levels {
                Some(levels) if levels.len() == num_values => Ok(()),
                Some(levels) => Err(ParquetError::format(format!(
                    "{} levels for {} values",
                    levels.len(),
                    num_values
                ))),
                None => Err(ParquetError::format(
                    "column with levels needs a level per slot",
                )),
            }
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{PhysicalType, Repetition};
    use crate::page::read_page_header;
    use std::io::Cursor;

    #[test]
    fn test_body_length_must_match_header() {
        let mut writer = PageWriter::new(Vec::new());
        let header = PageHeader {
            uncompressed_page_size: 4,
            compressed_page_size: 4,
            crc: None,
            body: PageBody::Index,
        };
        let err = writer.write_page(&header, &[1, 2]).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_required_column_page_has_no_level_stream() {
        let column = ColumnDescriptor::new("v", PhysicalType::Int32, Repetition::Required);
        let mut writer = PageWriter::new(Vec::new());
        writer
            .write_data_page(&column, Encoding::Plain, 1, None, &[7, 0, 0, 0])
            .unwrap();
        let buf = writer.into_inner();

        let mut cursor = Cursor::new(buf);
        let header = read_page_header(&mut cursor).unwrap();
        assert_eq!(header.compressed_page_size, 4);
        let rest = &cursor.get_ref()[cursor.position() as usize..];
        assert_eq!(rest, &[7, 0, 0, 0]);
    }

    #[test]
    fn test_optional_column_requires_levels() {
        let column = ColumnDescriptor::new("v", PhysicalType::Int32, Repetition::Optional);
        let mut writer = PageWriter::new(Vec::new());
        let err = writer
            .write_data_page(&column, Encoding::Plain, 1, None, &[7, 0, 0, 0])
            .unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_v2_header_carries_level_byte_lengths() {
        let column = ColumnDescriptor::new("v", PhysicalType::Int32, Repetition::Optional);
        let levels = [Levels { d: 1, r: 0 }, Levels { d: 0, r: 0 }, Levels { d: 1, r: 0 }];
        let mut writer = PageWriter::new(Vec::new());
        writer
            .write_data_page_v2(
                &column,
                Encoding::Plain,
                3,
                Some(&levels),
                &[1, 0, 0, 0, 2, 0, 0, 0],
            )
            .unwrap();
        let buf = writer.into_inner();

        let header = read_page_header(Cursor::new(buf)).unwrap();
        match header.body {
            PageBody::DataV2(h) => {
                assert_eq!(h.num_values, 3);
                assert_eq!(h.num_nulls, 1);
                assert_eq!(h.num_rows, 3);
                assert_eq!(h.repetition_levels_byte_length, 0);
                assert!(h.definition_levels_byte_length > 0);
                assert!(!h.is_compressed);
            }
            other => panic!("expected v2 body, got {:?}", other),
        }
    }

    #[test]
    fn test_pages_written_counter() {
        let mut writer = PageWriter::new(Vec::new());
        writer.write_index_page(&[]).unwrap();
        writer.write_dictionary_page(0, &[]).unwrap();
        assert_eq!(writer.pages_written(), 2);
    }
}
