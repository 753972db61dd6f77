//! Bounds-checked little-endian cursor.

use std::str;

use crate::BufferError;

/// A little-endian reader over a byte slice.
///
/// Reads never panic. Running out of data yields
/// [`BufferError::EndOfBuffer`] and leaves the position where it was, so a
/// caller can report the offset of the failed read.
///
/// ```
/// use prp_buffers::Reader;
///
/// let mut reader = Reader::new(&[0x01, 0x02, 0x03, 0x04]);
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u16().unwrap(), 0x0302);
/// assert!(reader.u16().is_err());
/// assert_eq!(reader.position(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Exclusive.
    end: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            end: bytes.len(),
        }
    }

    /// A reader over `bytes[start..end]` that keeps absolute positions.
    /// `end` is clamped to the slice length.
    pub fn from_slice(bytes: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            bytes,
            pos: start,
            end: end.min(bytes.len()),
        }
    }

    /// Absolute offset of the next read.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.end
    }

    pub fn seek(&mut self, pos: usize) -> Result<(), BufferError> {
        if pos > self.end {
            return Err(BufferError::EndOfBuffer {
                offset: pos,
                need: 0,
                have: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    #[inline]
    fn ensure(&self, need: usize) -> Result<(), BufferError> {
        let have = self.remaining();
        if need > have {
            return Err(BufferError::EndOfBuffer {
                offset: self.pos,
                need,
                have,
            });
        }
        Ok(())
    }

    pub fn peek(&self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        Ok(self.bytes[self.pos])
    }

    pub fn skip(&mut self, count: usize) -> Result<(), BufferError> {
        self.ensure(count)?;
        self.pos += count;
        Ok(())
    }

    /// Borrows the next `len` bytes.
    pub fn buf(&mut self, len: usize) -> Result<&'a [u8], BufferError> {
        self.ensure(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..self.pos])
    }

    /// Splits off a reader over the next `len` bytes.
    pub fn cut(&mut self, len: usize) -> Result<Reader<'a>, BufferError> {
        self.ensure(len)?;
        let inner = Reader::from_slice(self.bytes, self.pos, self.pos + len);
        self.pos += len;
        Ok(inner)
    }

    #[inline]
    fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.buf(N)?);
        Ok(out)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    pub fn i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.u8()? as i8)
    }

    #[inline]
    pub fn u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn i16(&mut self) -> Result<i16, BufferError> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Reads `len` bytes of UTF-8.
    pub fn utf8(&mut self, len: usize) -> Result<&'a str, BufferError> {
        let offset = self.pos;
        let bytes = self.buf(len)?;
        str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8 { offset })
    }

    /// Reads a `u32` length prefix followed by that many UTF-8 bytes.
    pub fn str32(&mut self) -> Result<&'a str, BufferError> {
        let len = self.u32()? as usize;
        self.utf8(len)
    }

    /// Reads a NUL-terminated UTF-8 string and consumes the terminator.
    pub fn cstr(&mut self) -> Result<&'a str, BufferError> {
        let start = self.pos;
        let window = &self.bytes[start.min(self.end)..self.end];
        let Some(len) = window.iter().position(|&b| b == 0) else {
            return Err(BufferError::EndOfBuffer {
                offset: start,
                need: window.len() + 1,
                have: window.len(),
            });
        };
        let s = str::from_utf8(&window[..len])
            .map_err(|_| BufferError::InvalidUtf8 { offset: start })?;
        self.pos += len + 1;
        Ok(s)
    }
}
