//! RLE / bit-packing hybrid codec.
//!
//! The hybrid stream interleaves two run kinds behind ULEB128 run headers:
//! an even header is an RLE run (`header >> 1` slots of one value stored in
//! `ceil(bit_width / 8)` little-endian bytes), an odd header is a bit-packed
//! run (`(header >> 1) * 8` values packed LSB-first at `bit_width` bits
//! each). Booleans, definition/repetition levels and dictionary indices all
//! travel this way.

use bytes::Bytes;

use crate::{ParquetError, Result};

/// Number of bits needed to store values up to and including `max`.
///
/// `max == 0` yields width 0: zero payload bits, value always 0.
pub fn bit_width_from_max_int(max: u32) -> u8 {
    (32 - max.leading_zeros()) as u8
}

fn bytes_for_rle_value(bit_width: u8) -> usize {
    (bit_width as usize + 7) / 8
}

fn read_uleb128(data: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *data
            .get(*pos)
            .ok_or_else(|| ParquetError::format("run header truncated"))?;
        *pos += 1;
        value |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 63 {
            return Err(ParquetError::format("run header varint overflow"));
        }
    }
}

fn write_uleb128(out: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Stateful decoder over one hybrid stream
pub struct HybridDecoder {
    data: Bytes,
    pos: usize,
    bit_width: u8,
}

impl HybridDecoder {
    pub fn new(data: Bytes, bit_width: u8) -> Self {
        HybridDecoder {
            data,
            pos: 0,
            bit_width,
        }
    }

    /// Bytes consumed from the stream so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Decode values into `out`, bounded by `max_count`.
    ///
    /// The stream's own run headers determine how many values exist; the
    /// stream running dry at a run boundary leaves `out` short of
    /// `max_count`, which callers with an exact expectation must treat as
    /// their own error. A run truncated mid-payload is a format error here.
    pub fn decode(&mut self, out: &mut Vec<u32>, max_count: usize) -> Result<()> {
        if self.bit_width == 0 {
            // zero-width values carry no payload at all
            out.resize(out.len() + max_count, 0);
            return Ok(());
        }
        if self.bit_width > 32 {
            return Err(ParquetError::format("bit width above 32"));
        }
        let target = out.len() + max_count;
        while out.len() < target {
            if self.pos >= self.data.len() {
                return Ok(());
            }
            let header = read_uleb128(&self.data, &mut self.pos)?;
            if header & 1 == 0 {
                self.decode_rle_run(out, target, (header >> 1) as usize)?;
            } else {
                self.decode_bit_packed_run(out, target, (header >> 1) as usize)?;
            }
        }
        Ok(())
    }

    fn decode_rle_run(&mut self, out: &mut Vec<u32>, target: usize, run_len: usize) -> Result<()> {
        let width_bytes = bytes_for_rle_value(self.bit_width);
        if self.pos + width_bytes > self.data.len() {
            return Err(ParquetError::format("RLE run truncated"));
        }
        let mut raw = [0u8; 4];
        raw[..width_bytes].copy_from_slice(&self.data[self.pos..self.pos + width_bytes]);
        self.pos += width_bytes;
        let value = u32::from_le_bytes(raw);
        let take = run_len.min(target - out.len());
        out.resize(out.len() + take, value);
        Ok(())
    }

    fn decode_bit_packed_run(
        &mut self,
        out: &mut Vec<u32>,
        target: usize,
        groups: usize,
    ) -> Result<()> {
        let width = self.bit_width as usize;
        // one group is 8 values, 8 * width bits = width bytes
        let byte_len = groups * width;
        if self.pos + byte_len > self.data.len() {
            return Err(ParquetError::format("bit-packed run truncated"));
        }
        let packed = &self.data[self.pos..self.pos + byte_len];
        let total_values = groups * 8;
        let take = total_values.min(target - out.len());
        for i in 0..take {
            let mut value = 0u32;
            let base = i * width;
            for b in 0..width {
                let bit = base + b;
                if packed[bit / 8] >> (bit % 8) & 1 == 1 {
                    value |= 1 << b;
                }
            }
            out.push(value);
        }
        self.pos += byte_len;
        Ok(())
    }
}

/// Stateful encoder producing one hybrid stream.
///
/// Boundary choice is greedy: a run of 8 or more identical values becomes an
/// RLE run, everything else accumulates into bit-packed groups of 8 (the
/// final group zero-padded; the decoder's bounded count drops the padding).
pub struct HybridEncoder {
    bit_width: u8,
    out: Vec<u8>,
    pending: Vec<u32>,
}

impl HybridEncoder {
    pub fn new(bit_width: u8) -> Self {
        HybridEncoder {
            bit_width,
            out: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Append values to the stream
    pub fn encode(&mut self, values: &[u32]) -> Result<()> {
        if self.bit_width == 0 {
            if values.iter().any(|&v| v != 0) {
                return Err(ParquetError::format("nonzero value at bit width 0"));
            }
            return Ok(());
        }
        if self.bit_width < 32 {
            let limit = 1u32 << self.bit_width;
            if let Some(&v) = values.iter().find(|&&v| v >= limit) {
                return Err(ParquetError::format(format!(
                    "value {} does not fit in {} bits",
                    v, self.bit_width
                )));
            }
        }
        let mut i = 0;
        while i < values.len() {
            let value = values[i];
            let mut j = i + 1;
            while j < values.len() && values[j] == value {
                j += 1;
            }
            let run = j - i;
            if run >= 8 {
                self.flush_pending();
                self.write_rle_run(value, run);
            } else {
                self.pending.extend_from_slice(&values[i..j]);
            }
            i = j;
        }
        Ok(())
    }

    /// Finish the stream and return its bytes
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush_pending();
        self.out
    }

    fn write_rle_run(&mut self, value: u32, run_len: usize) {
        write_uleb128(&mut self.out, (run_len as u64) << 1);
        let width_bytes = bytes_for_rle_value(self.bit_width);
        self.out
            .extend_from_slice(&value.to_le_bytes()[..width_bytes]);
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let width = self.bit_width as usize;
        let groups = (self.pending.len() + 7) / 8;
        write_uleb128(&mut self.out, ((groups as u64) << 1) | 1);
        let mut packed = vec![0u8; groups * width];
        for (i, &value) in self.pending.iter().enumerate() {
            let base = i * width;
            for b in 0..width {
                if value >> b & 1 == 1 {
                    let bit = base + b;
                    packed[bit / 8] |= 1 << (bit % 8);
                }
            }
        }
        self.out.extend_from_slice(&packed);
        self.pending.clear();
    }
}

/// Encode one v1 level stream: hybrid bytes behind a 4-byte little-endian
/// length prefix
pub fn encode_levels_v1(levels: &[u16], max_level: u16) -> Result<Vec<u8>> {
    let body = encode_levels_v2(levels, max_level)?;
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Encode one v2 level stream: raw hybrid bytes, length carried by the page
/// header instead of a prefix
pub fn encode_levels_v2(levels: &[u16], max_level: u16) -> Result<Vec<u8>> {
    let width = bit_width_from_max_int(max_level as u32);
    let mut encoder = HybridEncoder::new(width);
    let widened: Vec<u32> = levels.iter().map(|&l| l as u32).collect();
    encoder.encode(&widened)?;
    Ok(encoder.into_bytes())
}

/// Decode one v1 level stream. Returns the levels and the total bytes
/// consumed, length prefix included.
pub fn decode_levels_v1(data: &Bytes, count: usize, max_level: u16) -> Result<(Vec<u16>, usize)> {
    if data.len() < 4 {
        return Err(ParquetError::format("level stream missing length prefix"));
    }
    let mut len_raw = [0u8; 4];
    len_raw.copy_from_slice(&data[..4]);
    let byte_len = u32::from_le_bytes(len_raw) as usize;
    if 4 + byte_len > data.len() {
        return Err(ParquetError::format("level stream length prefix out of range"));
    }
    let levels = decode_level_bytes(data.slice(4..4 + byte_len), count, max_level)?;
    Ok((levels, 4 + byte_len))
}

/// Decode one v2 level stream of exactly the bytes the page header declared
pub fn decode_levels_v2(data: Bytes, count: usize, max_level: u16) -> Result<Vec<u16>> {
    decode_level_bytes(data, count, max_level)
}

fn decode_level_bytes(data: Bytes, count: usize, max_level: u16) -> Result<Vec<u16>> {
    let width = bit_width_from_max_int(max_level as u32);
    let mut decoder = HybridDecoder::new(data, width);
    let mut raw = Vec::with_capacity(count);
    decoder.decode(&mut raw, count)?;
    if raw.len() < count {
        return Err(ParquetError::format(format!(
            "level stream holds {} of {} levels",
            raw.len(),
            count
        )));
    }
    raw.iter()
        .map(|&l| {
            if l > max_level as u32 {
                Err(ParquetError::format(format!(
                    "level {} above maximum {}",
                    l, max_level
                )))
            } else {
                Ok(l as u16)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn decode_all(data: Vec<u8>, bit_width: u8, count: usize) -> Result<Vec<u32>> {
        let mut decoder = HybridDecoder::new(Bytes::from(data), bit_width);
        let mut out = Vec::new();
        decoder.decode(&mut out, count)?;
        Ok(out)
    }

    #[test]
    fn test_bit_width_from_max_int() {
        assert_eq!(bit_width_from_max_int(0), 0);
        assert_eq!(bit_width_from_max_int(1), 1);
        assert_eq!(bit_width_from_max_int(255), 8);
        assert_eq!(bit_width_from_max_int(256), 9);
        assert_eq!(bit_width_from_max_int(u32::MAX), 32);
    }

    #[test]
    fn test_decode_rle_run() {
        // header 12 -> RLE run of 6, value 3 in one byte at width 2
        let out = decode_all(vec![0x0c, 0x03], 2, 6).unwrap();
        assert_eq!(out, vec![3; 6]);
    }

    #[test]
    fn test_decode_bit_packed_group() {
        // header 3 -> one bit-packed group, byte 0x55 is alternating bits
        let out = decode_all(vec![0x03, 0x55], 1, 8).unwrap();
        assert_eq!(out, vec![1, 0, 1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_bit_width_zero_consumes_nothing() {
        let data = Bytes::from(vec![0xff, 0xff]);
        let mut decoder = HybridDecoder::new(data, 0);
        let mut out = Vec::new();
        decoder.decode(&mut out, 5).unwrap();
        assert_eq!(out, vec![0; 5]);
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn test_truncated_rle_run() {
        // RLE header for 4 values at width 16 but no value bytes
        let err = decode_all(vec![0x08], 16, 4).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_truncated_bit_packed_run() {
        // one group of width 8 needs 8 bytes, only 2 present
        let err = decode_all(vec![0x03, 0xab, 0xcd], 8, 8).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_stream_shorter_than_bound_is_not_an_error() {
        // a single RLE run of 4, caller asks for 10
        let out = decode_all(vec![0x08, 0x01], 1, 10).unwrap();
        assert_eq!(out, vec![1; 4]);
    }

    #[test]
    fn test_encode_value_too_wide() {
        let mut encoder = HybridEncoder::new(2);
        let err = encoder.encode(&[4]).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_roundtrip_mixed_runs() {
        let values = vec![7, 7, 7, 7, 7, 7, 7, 7, 7, 1, 2, 3, 4, 5, 7, 7, 7, 0];
        let mut encoder = HybridEncoder::new(3);
        encoder.encode(&values).unwrap();
        let out = decode_all(encoder.into_bytes(), 3, values.len()).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn test_roundtrip_all_widths() {
        let mut rng = rand::rng();
        for width in 0u8..=32 {
            let mask = if width == 32 {
                u32::MAX
            } else {
                (1u64 << width) as u32 - 1
            };
            let values: Vec<u32> = (0..200)
                .map(|i| {
                    if i % 30 < 12 {
                        // long stretches force RLE runs
                        mask / 2
                    } else {
                        rng.random::<u32>() & mask
                    }
                })
                .collect();
            let mut encoder = HybridEncoder::new(width);
            encoder.encode(&values).unwrap();
            let out = decode_all(encoder.into_bytes(), width, values.len()).unwrap();
            assert_eq!(out, values, "width {}", width);
        }
    }

    #[test]
    fn test_roundtrip_single_value() {
        let mut encoder = HybridEncoder::new(5);
        encoder.encode(&[19]).unwrap();
        let out = decode_all(encoder.into_bytes(), 5, 1).unwrap();
        assert_eq!(out, vec![19]);
    }

    #[test]
    fn test_roundtrip_empty() {
        let encoder = HybridEncoder::new(4);
        let out = decode_all(encoder.into_bytes(), 4, 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_levels_v1_roundtrip() {
        let levels: Vec<u16> = vec![1, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0];
        let encoded = encode_levels_v1(&levels, 1).unwrap();
        let data = Bytes::from(encoded);
        let (decoded, consumed) = decode_levels_v1(&data, levels.len(), 1).unwrap();
        assert_eq!(decoded, levels);
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn test_levels_v2_has_no_prefix() {
        let levels: Vec<u16> = vec![2, 1, 0, 2, 2, 2, 2, 2, 2, 2];
        let v1 = encode_levels_v1(&levels, 2).unwrap();
        let v2 = encode_levels_v2(&levels, 2).unwrap();
        assert_eq!(&v1[4..], &v2[..]);
        let decoded = decode_levels_v2(Bytes::from(v2), levels.len(), 2).unwrap();
        assert_eq!(decoded, levels);
    }

    #[test]
    fn test_level_above_maximum() {
        // RLE run of two slots holding level 3, decoded against max level 2
        // (same bit width, out-of-range value)
        let err = decode_levels_v2(Bytes::from(vec![0x04, 0x03]), 2, 2).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }

    #[test]
    fn test_level_stream_too_short() {
        let encoded = encode_levels_v2(&[1, 0, 1], 1).unwrap();
        let err = decode_levels_v2(Bytes::from(encoded), 50, 1).unwrap_err();
        assert!(matches!(err, ParquetError::Format(_)));
    }
}
