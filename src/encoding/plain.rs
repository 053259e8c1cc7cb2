//! PLAIN encoding: little-endian fixed-width scalars and length-prefixed
//! byte arrays.
//!
//! Booleans are the one "plain" type that is itself bit-packed: they travel
//! through the hybrid codec at bit width 1.

use bytes::Bytes;

use super::rle::{HybridDecoder, HybridEncoder};
use super::{Decoder, Encoder};
use crate::metadata::Encoding;
use crate::{ParquetError, Result};

/// Decoder for the PLAIN encoding
pub struct PlainDecoder {
    data: Bytes,
    pos: usize,
    remaining: usize,
}

impl PlainDecoder {
    pub fn new() -> Self {
        PlainDecoder {
            data: Bytes::new(),
            pos: 0,
            remaining: 0,
        }
    }

    fn take_count(&self, cap: usize) -> usize {
        self.remaining.min(cap)
    }

    fn decode_fixed<T, const W: usize>(
        &mut self,
        out: &mut [T],
        from_le: fn([u8; W]) -> T,
    ) -> Result<usize> {
        let count = self.take_count(out.len());
        for (i, slot) in out.iter_mut().take(count).enumerate() {
            if self.pos + W > self.data.len() {
                return Err(ParquetError::ShortRead {
                    decoded: i,
                    expected: count,
                });
            }
            let mut raw = [0u8; W];
            raw.copy_from_slice(&self.data[self.pos..self.pos + W]);
            *slot = from_le(raw);
            self.pos += W;
        }
        self.remaining -= count;
        Ok(count)
    }
}

impl Default for PlainDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PlainDecoder {
    fn set_data(&mut self, data: Bytes, num_values: usize) -> Result<()> {
        self.data = data;
        self.pos = 0;
        self.remaining = num_values;
        Ok(())
    }

    fn decode_bool(&mut self, out: &mut [bool]) -> Result<usize> {
        let count = self.take_count(out.len());
        let mut decoder = HybridDecoder::new(self.data.slice(self.pos..), 1);
        let mut raw = Vec::with_capacity(count);
        decoder.decode(&mut raw, count)?;
        if raw.len() < count {
            return Err(ParquetError::ShortRead {
                decoded: raw.len(),
                expected: count,
            });
        }
        for (slot, &bit) in out.iter_mut().zip(raw.iter()) {
            *slot = bit != 0;
        }
        self.pos += decoder.position();
        self.remaining -= count;
        Ok(count)
    }

    fn decode_int32(&mut self, out: &mut [i32]) -> Result<usize> {
        self.decode_fixed(out, i32::from_le_bytes)
    }

    fn decode_int64(&mut self, out: &mut [i64]) -> Result<usize> {
        self.decode_fixed(out, i64::from_le_bytes)
    }

    fn decode_float32(&mut self, out: &mut [f32]) -> Result<usize> {
        self.decode_fixed(out, f32::from_le_bytes)
    }

    fn decode_float64(&mut self, out: &mut [f64]) -> Result<usize> {
        self.decode_fixed(out, f64::from_le_bytes)
    }

    fn decode_byte_array(&mut self, out: &mut [Bytes]) -> Result<usize> {
        let count = self.take_count(out.len());
        for (i, slot) in out.iter_mut().take(count).enumerate() {
            if self.pos + 4 > self.data.len() {
                return Err(ParquetError::ShortRead {
                    decoded: i,
                    expected: count,
                });
            }
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&self.data[self.pos..self.pos + 4]);
            let len = u32::from_le_bytes(raw) as usize;
            if self.pos + 4 + len > self.data.len() {
                return Err(ParquetError::ShortRead {
                    decoded: i,
                    expected: count,
                });
            }
            *slot = self.data.slice(self.pos + 4..self.pos + 4 + len);
            self.pos += 4 + len;
        }
        self.remaining -= count;
        Ok(count)
    }
}

/// Encoder for the PLAIN encoding.
///
/// Scalars append to the page buffer immediately; booleans accumulate until
/// flush so the hybrid stream covers the whole page.
pub struct PlainEncoder {
    buf: Vec<u8>,
    bools: Vec<bool>,
    num_values: usize,
}

impl PlainEncoder {
    pub fn new() -> Self {
        PlainEncoder {
            buf: Vec::new(),
            bools: Vec::new(),
            num_values: 0,
        }
    }
}

impl Default for PlainEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for PlainEncoder {
    fn write_bool(&mut self, values: &[bool]) -> Result<()> {
        self.num_values += values.len();
        self.bools.extend_from_slice(values);
        Ok(())
    }

    fn write_int32(&mut self, values: &[i32]) -> Result<()> {
        self.num_values += values.len();
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    fn write_int64(&mut self, values: &[i64]) -> Result<()> {
        self.num_values += values.len();
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    fn write_float32(&mut self, values: &[f32]) -> Result<()> {
        self.num_values += values.len();
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    fn write_float64(&mut self, values: &[f64]) -> Result<()> {
        self.num_values += values.len();
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    fn write_byte_array(&mut self, values: &[Bytes]) -> Result<()> {
        self.num_values += values.len();
        for v in values {
            self.buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
            self.buf.extend_from_slice(v);
        }
        Ok(())
    }

    fn num_values(&self) -> usize {
        self.num_values
    }

    fn encoding(&self) -> Encoding {
        Encoding::Plain
    }

    fn flush(&mut self) -> Result<Bytes> {
        if !self.bools.is_empty() {
            let mut encoder = HybridEncoder::new(1);
            let bits: Vec<u32> = self.bools.iter().map(|&b| b as u32).collect();
            encoder.encode(&bits)?;
            self.buf.extend_from_slice(&encoder.into_bytes());
            self.bools.clear();
        }
        self.num_values = 0;
        Ok(Bytes::from(std::mem::take(&mut self.buf)))
    }
}
