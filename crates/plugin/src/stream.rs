//! Varint streams serializers encode payloads through.
//!
//! Strings never hit the wire inline: `write_name` routes them through the
//! file-local string table, so a name repeated across thousands of stubs is
//! stored once.

use stubscope_api::error::{ApiError, ApiResult};
use stubscope_api::models::varint;

/// Assigns file-local string-table slots during serialization.
pub trait StringEnumerator {
    fn enumerate(&mut self, s: &str) -> u32;
}

pub struct StubOutput<'a> {
    buf: &'a mut Vec<u8>,
    strings: &'a mut dyn StringEnumerator,
}

impl<'a> StubOutput<'a> {
    pub fn new(buf: &'a mut Vec<u8>, strings: &'a mut dyn StringEnumerator) -> Self {
        Self { buf, strings }
    }

    pub fn write_uint(&mut self, v: u64) {
        varint::write_u64(self.buf, v);
    }

    pub fn write_int(&mut self, v: i64) {
        varint::write_i64(self.buf, v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    /// Writes an interned string as its table reference.
    pub fn write_name(&mut self, s: &str) {
        let slot = self.strings.enumerate(s);
        varint::write_u64(self.buf, u64::from(slot));
    }
}

pub struct StubInput<'a> {
    buf: &'a [u8],
    pos: usize,
    strings: &'a [String],
}

impl<'a> StubInput<'a> {
    pub fn new(buf: &'a [u8], strings: &'a [String]) -> Self {
        Self {
            buf,
            pos: 0,
            strings,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn read_uint(&mut self) -> ApiResult<u64> {
        varint::read_u64(self.buf, &mut self.pos)
    }

    pub fn read_int(&mut self) -> ApiResult<i64> {
        varint::read_i64(self.buf, &mut self.pos)
    }

    pub fn read_bool(&mut self) -> ApiResult<bool> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| ApiError::Corrupted("truncated bool".to_string()))?;
        self.pos += 1;
        Ok(byte != 0)
    }

    pub fn read_name(&mut self) -> ApiResult<&'a str> {
        let slot = self.read_uint()?;
        self.strings
            .get(slot as usize)
            .map(String::as_str)
            .ok_or_else(|| ApiError::Corrupted(format!("string table slot {slot} out of range")))
    }
}
