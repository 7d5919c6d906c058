//! LEB128 varint encoding shared by the stub wire format and the id-list codec.

use crate::error::{ApiError, ApiResult};

pub fn write_u64(buf: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub fn read_u64(buf: &[u8], pos: &mut usize) -> ApiResult<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *buf
            .get(*pos)
            .ok_or_else(|| ApiError::Corrupted("truncated varint".to_string()))?;
        *pos += 1;
        if shift >= 64 {
            return Err(ApiError::Corrupted("varint overflows u64".to_string()));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Zigzag-encoded signed varint.
pub fn write_i64(buf: &mut Vec<u8>, v: i64) {
    write_u64(buf, ((v << 1) ^ (v >> 63)) as u64);
}

pub fn read_i64(buf: &[u8], pos: &mut usize) -> ApiResult<i64> {
    let raw = read_u64(buf, pos)?;
    Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
}
