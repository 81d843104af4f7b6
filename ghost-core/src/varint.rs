//! LEB128 varints with zigzag mapping for signed values.

use crate::error::DecodeError;

const MAX_VARINT_BYTES: usize = 5;

#[inline]
pub fn zigzag_encode(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
pub fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

pub fn write_varint_u32(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

#[inline]
pub fn write_varint_i32(out: &mut Vec<u8>, value: i32) {
    write_varint_u32(out, zigzag_encode(value));
}

/// Bounds-checked cursor over an encoded stream.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .bytes
            .get(self.offset)
            .ok_or(DecodeError::Truncated {
                offset: self.offset,
            })?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_varint_u32(&mut self) -> Result<u32, DecodeError> {
        let start = self.offset;
        let mut value = 0u32;

        for index in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;
            let payload = (byte & 0x7F) as u32;
            // The fifth byte only has room for the top 4 bits.
            if index == MAX_VARINT_BYTES - 1 && payload > 0x0F {
                return Err(DecodeError::VarintOverflow { offset: start });
            }
            value |= payload << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }

        Err(DecodeError::VarintOverflow { offset: start })
    }

    #[inline]
    pub fn read_varint_i32(&mut self) -> Result<i32, DecodeError> {
        self.read_varint_u32().map(zigzag_decode)
    }
}
