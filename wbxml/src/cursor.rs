//! Sequential reader over a WBXML buffer.

use crate::{varint, Error};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::{Buf, Bytes};

/// Reads primitives from an immutable buffer, advancing monotonically.
///
/// Every read fails with [Error::EndOfBuffer] if the buffer runs out before the value is
/// complete.
#[derive(Clone, Debug)]
pub struct Cursor {
    buf: Bytes,
}

impl Cursor {
    /// Creates a cursor positioned at the start of `buf`.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns true if unread bytes remain.
    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        if !self.buf.has_remaining() {
            return Err(Error::EndOfBuffer);
        }
        Ok(self.buf.get_u8())
    }

    /// Reads a multibyte integer.
    pub fn read_mb_u32(&mut self) -> Result<u32, Error> {
        varint::read(&mut self.buf)
    }

    /// Reads exactly `len` bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, Error> {
        if self.buf.remaining() < len {
            return Err(Error::EndOfBuffer);
        }
        Ok(self.buf.split_to(len))
    }

    /// Reads a null-terminated UTF-8 string. The terminator is consumed but not returned.
    pub fn read_cstr(&mut self) -> Result<String, Error> {
        let len = self
            .buf
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::EndOfBuffer)?;
        let raw = self.buf.split_to(len);
        self.buf.advance(1);
        String::from_utf8(raw.to_vec()).map_err(|_| Error::InvalidUtf8)
    }

    /// Reads exactly `len` bytes as a string of one character per byte.
    pub fn read_str(&mut self, len: usize) -> Result<String, Error> {
        let raw = self.read_bytes(len)?;
        Ok(raw.iter().map(|&b| char::from(b)).collect())
    }

    /// Reads exactly `len` bytes and returns their standard base64 encoding.
    pub fn read_base64(&mut self, len: usize) -> Result<String, Error> {
        let raw = self.read_bytes(len)?;
        Ok(BASE64.encode(&raw))
    }
}
