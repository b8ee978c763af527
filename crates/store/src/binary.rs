//! Little-endian binary primitives
//!
//! Layout:
//! - integers and floats are little-endian, fixed width
//! - bools are one byte, non-zero is true
//! - chars are their UTF-8 bytes
//! - strings are a 7-bit variable-length byte count followed by UTF-8

use crate::error::DecodeError;
use bytes::{Buf, BufMut, BytesMut};

/// Bounds-checked reader over a byte slice
pub struct BinaryReader<'a> {
    buf: &'a [u8],
}

impl<'a> BinaryReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if self.buf.remaining() < needed {
            return Err(DecodeError::UnexpectedEof {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.ensure(8)?;
        Ok(self.buf.get_f64_le())
    }

    /// Non-negative i32 count
    pub fn read_count(&mut self) -> Result<usize, DecodeError> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| DecodeError::NegativeCount(count))
    }

    /// 7-bit variable-length unsigned integer, at most 5 bytes
    pub fn read_7bit_len(&mut self) -> Result<usize, DecodeError> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            if shift == 28 && byte > 0x0F {
                return Err(DecodeError::BadLength);
            }
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return usize::try_from(value).map_err(|_| DecodeError::BadLength);
            }
        }
        Err(DecodeError::BadLength)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_7bit_len()?;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8("string"))
    }

    /// A single UTF-8 encoded char
    pub fn read_char(&mut self) -> Result<char, DecodeError> {
        let first = *self.buf.first().ok_or(DecodeError::UnexpectedEof {
            needed: 1,
            remaining: 0,
        })?;
        let width = match first {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(DecodeError::InvalidUtf8("char")),
        };
        let bytes = self.read_bytes(width)?;
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or(DecodeError::InvalidUtf8("char"))
    }
}

/// Growable little-endian writer
#[derive(Default)]
pub struct BinaryWriter {
    buf: BytesMut,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    /// Count written as i32, saturating at `i32::MAX`
    pub fn write_count(&mut self, count: usize) {
        self.write_i32(i32::try_from(count).unwrap_or(i32::MAX));
    }

    pub fn write_7bit_len(&mut self, len: usize) {
        let mut value = len;
        while value >= 0x80 {
            self.buf.put_u8((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_7bit_len(value.len());
        self.buf.put_slice(value.as_bytes());
    }

    pub fn write_char(&mut self, value: char) {
        let mut tmp = [0u8; 4];
        self.buf.put_slice(value.encode_utf8(&mut tmp).as_bytes());
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}
