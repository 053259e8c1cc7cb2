//! Dictionary-index decoding.
//!
//! A chunk's dictionary page is plain-decoded once into a typed table; data
//! pages carrying dictionary indices then decode through [`DictionaryDecoder`],
//! which persists across the pages of the chunk. The index stream is one
//! bit-width byte followed by a hybrid run stream.

use bytes::Bytes;

use super::plain::PlainDecoder;
use super::rle::HybridDecoder;
use super::Decoder;
use crate::metadata::PhysicalType;
use crate::{ParquetError, Result};

/// Typed dictionary table decoded from a dictionary page
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryValues {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    ByteArray(Vec<Bytes>),
}

impl DictionaryValues {
    /// Plain-decode a dictionary page body into a table for the column's
    /// physical type
    pub fn read(physical_type: PhysicalType, data: Bytes, num_values: usize) -> Result<Self> {
        let mut decoder = PlainDecoder::new();
        decoder.set_data(data, num_values)?;
        match physical_type {
            PhysicalType::Boolean => {
                let mut out = vec![false; num_values];
                let n = decoder.decode_bool(&mut out)?;
                out.truncate(n);
                Ok(DictionaryValues::Bool(out))
            }
            PhysicalType::Int32 => {
                let mut out = vec![0i32; num_values];
                let n = decoder.decode_int32(&mut out)?;
                out.truncate(n);
                Ok(DictionaryValues::Int32(out))
            }
            PhysicalType::Int64 => {
                let mut out = vec![0i64; num_values];
                let n = decoder.decode_int64(&mut out)?;
                out.truncate(n);
                Ok(DictionaryValues::Int64(out))
            }
            PhysicalType::Float => {
                let mut out = vec![0f32; num_values];
                let n = decoder.decode_float32(&mut out)?;
                out.truncate(n);
                Ok(DictionaryValues::Float32(out))
            }
            PhysicalType::Double => {
                let mut out = vec![0f64; num_values];
                let n = decoder.decode_float64(&mut out)?;
                out.truncate(n);
                Ok(DictionaryValues::Float64(out))
            }
            PhysicalType::ByteArray => {
                let mut out = vec![Bytes::new(); num_values];
                let n = decoder.decode_byte_array(&mut out)?;
                out.truncate(n);
                Ok(DictionaryValues::ByteArray(out))
            }
            other => Err(ParquetError::unsupported(format!(
                "dictionary of physical type {}",
                other.type_name()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DictionaryValues::Bool(v) => v.len(),
            DictionaryValues::Int32(v) => v.len(),
            DictionaryValues::Int64(v) => v.len(),
            DictionaryValues::Float32(v) => v.len(),
            DictionaryValues::Float64(v) => v.len(),
            DictionaryValues::ByteArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoder serving dictionary-index data pages out of the chunk's table
pub struct DictionaryDecoder {
    dict: DictionaryValues,
    indices: Vec<u32>,
    pos: usize,
}

impl DictionaryDecoder {
    pub fn new(dict: DictionaryValues) -> Self {
        DictionaryDecoder {
            dict,
            indices: Vec::new(),
            pos: 0,
        }
    }

    fn take_indices(&mut self, cap: usize) -> Result<std::ops::Range<usize>> {
        let count = (self.indices.len() - self.pos).min(cap);
        let range = self.pos..self.pos + count;
        let limit = self.dict.len() as u32;
        if let Some(&bad) = self.indices[range.clone()].iter().find(|&&i| i >= limit) {
            return Err(ParquetError::format(format!(
                "dictionary index {} out of range for table of {}",
                bad, limit
            )));
        }
        self.pos += count;
        Ok(range)
    }

    fn type_mismatch(&self, requested: &str) -> ParquetError {
        ParquetError::format(format!(
            "dictionary holds no {} values",
            requested
        ))
    }
}

impl Decoder for DictionaryDecoder {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        if data.is_empty() {
            return Err(ParquetError::format("dictionary index page without bit width"));
        }
        let bit_width = data[0];
        if bit_width > 32 {
            return Err(ParquetError::format(format!(
                "dictionary index bit width {} above 32",
                bit_width
            )));
        }
        let mut decoder = HybridDecoder::new(data.slice(1..), bit_width);
        let mut indices = Vec::with_capacity(num_values);
        decoder.decode(&mut indices, num_values)?;
        if indices.len() < num_values {
            return Err(ParquetError::ShortRead {
                decoded: indices.len(),
                expected: num_values,
            });
        }
        self.indices = indices;
        self.pos = 0;
        Ok(())
    }

    fn decode_bool(&mut self, out: &mut [bool]) -> Result<usize> {
        if !matches!(self.dict, DictionaryValues::Bool(_)) {
            return Err(self.type_mismatch("BOOLEAN"));
        }
        let range = self.take_indices(out.len())?;
        let count = range.len();
        if let DictionaryValues::Bool(table) = &self.dict {
            for (slot, &idx) in out.iter_mut().zip(self.indices[range].iter()) {
                *slot = table[idx as usize];
            }
        }
        Ok(count)
    }

    fn decode_int32(&mut self, out: &mut [i32]) -> Result<usize> {
        if !matches!(self.dict, DictionaryValues::Int32(_)) {
            return Err(self.type_mismatch("INT32"));
        }
        let range = self.take_indices(out.len())?;
        let count = range.len();
        if let DictionaryValues::Int32(table) = &self.dict {
            for (slot, &idx) in out.iter_mut().zip(self.indices[range].iter()) {
                *slot = table[idx as usize];
            }
        }
        Ok(count)
    }

    fn decode_int64(&mut self, out: &mut [i64]) -> Result<usize> {
        if !matches!(self.dict, DictionaryValues::Int64(_)) {
            return Err(self.type_mismatch("INT64"));
        }
        let range = self.take_indices(out.len())?;
        let count = range.len();
        if let DictionaryValues::Int64(table) = &self.dict {
            for (slot, &idx) in out.iter_mut().zip(self.indices[range].iter()) {
                *slot = table[idx as usize];
            }
        }
        Ok(count)
    }

    fn decode_float32(&mut self, out: &mut [f32]) -> Result<usize> {
        if !matches!(self.dict, DictionaryValues::Float32(_)) {
            return Err(self.type_mismatch("FLOAT"));
        }
        let range = self.take_indices(out.len())?;
        let count = range.len();
        if let DictionaryValues::Float32(table) = &self.dict {
            for (slot, &idx) in out.iter_mut().zip(self.indices[range].iter()) {
                *slot = table[idx as usize];
            }
        }
        Ok(count)
    }

    fn decode_float64(&mut self, out: &mut [f64]) -> Result<usize> {
        if !matches!(self.dict, DictionaryValues::Float64(_)) {
            return Err(self.type_mismatch("DOUBLE"));
        }
        let range = self.take_indices(out.len())?;
        let count = range.len();
        if let DictionaryValues::Float64(table) = &self.dict {
            for (slot, &idx) in out.iter_mut().zip(self.indices[range].iter()) {
                *slot = table[idx as usize];
            }
        }
        Ok(count)
    }

    fn decode_byte_array(&mut self, out: &mut [Bytes]) -> Result<usize> {
        if !matches!(self.dict, DictionaryValues::ByteArray(_)) {
            return Err(self.type_mismatch("BYTE_ARRAY"));
        }
        let range = self.take_indices(out.len())?;
        let count = range.len();
        if let DictionaryValues::ByteArray(table) = &self.dict {
            for (slot, &idx) in out.iter_mut().zip(self.indices[range].iter()) {
                *slot = table[idx as usize].clone();
            }
        }
        Ok(count)
    }
}
