//! Decoded page output: level pairs and typed value batches.

use bytes::Bytes;

use crate::encoding::Decoder;
use crate::metadata::PhysicalType;
use crate::{ParquetError, Result};

/// Definition/repetition level pair for one logical value slot.
///
/// `d` equal to the column's maximum definition level marks a value that is
/// materialized; `r` names the repeated ancestor where a new list element
/// begins (`r == 0` starts a new record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Levels {
    pub d: u16,
    pub r: u16,
}

/// One page's decoded values, typed by the column's physical type
#[derive(Debug, Clone, PartialEq)]
pub enum ValueBatch {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    ByteArray(Vec<Bytes>),
}

impl ValueBatch {
    /// Decode `count` values of the given physical type from a page-bound
    /// decoder
    pub fn decode(
        decoder: &mut dyn Decoder,
        physical_type: PhysicalType,
        count: usize,
    ) -> Result<Self> {
        match physical_type {
            PhysicalType::Boolean => {
                let mut out = vec![false; count];
                let n = decoder.decode_bool(&mut out)?;
                out.truncate(n);
                Ok(ValueBatch::Bool(out))
            }
            PhysicalType::Int32 => {
                let mut out = vec![0i32; count];
                let n = decoder.decode_int32(&mut out)?;
                out.truncate(n);
                Ok(ValueBatch::Int32(out))
            }
            PhysicalType::Int64 => {
                let mut out = vec![0i64; count];
                let n = decoder.decode_int64(&mut out)?;
                out.truncate(n);
                Ok(ValueBatch::Int64(out))
            }
            PhysicalType::Float => {
                let mut out = vec![0f32; count];
                let n = decoder.decode_float32(&mut out)?;
                out.truncate(n);
                Ok(ValueBatch::Float32(out))
            }
            PhysicalType::Double => {
                let mut out = vec![0f64; count];
                let n = decoder.decode_float64(&mut out)?;
                out.truncate(n);
                Ok(ValueBatch::Float64(out))
            }
            PhysicalType::ByteArray => {
                let mut out = vec![Bytes::new(); count];
                let n = decoder.decode_byte_array(&mut out)?;
                out.truncate(n);
                Ok(ValueBatch::ByteArray(out))
            }
            other => Err(ParquetError::unsupported(format!(
                "physical type {}",
                other.type_name()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueBatch::Bool(v) => v.len(),
            ValueBatch::Int32(v) => v.len(),
            ValueBatch::Int64(v) => v.len(),
            ValueBatch::Float32(v) => v.len(),
            ValueBatch::Float64(v) => v.len(),
            ValueBatch::ByteArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn physical_type(&self) -> PhysicalType {
        match self {
            ValueBatch::Bool(_) => PhysicalType::Boolean,
            ValueBatch::Int32(_) => PhysicalType::Int32,
            ValueBatch::Int64(_) => PhysicalType::Int64,
            ValueBatch::Float32(_) => PhysicalType::Float,
            ValueBatch::Float64(_) => PhysicalType::Double,
            ValueBatch::ByteArray(_) => PhysicalType::ByteArray,
        }
    }

    pub fn as_bools(&self) -> Option<&[bool]> {
        match self {
            ValueBatch::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int32s(&self) -> Option<&[i32]> {
        match self {
            ValueBatch::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int64s(&self) -> Option<&[i64]> {
        match self {
            ValueBatch::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float32s(&self) -> Option<&[f32]> {
        match self {
            ValueBatch::Float32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float64s(&self) -> Option<&[f64]> {
        match self {
            ValueBatch::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_arrays(&self) -> Option<&[Bytes]> {
        match self {
            ValueBatch::ByteArray(v) => Some(v),
            _ => None,
        }
    }
}
