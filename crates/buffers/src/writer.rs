//! Auto-growing binary buffer writer.

use crate::BufferError;

/// A little-endian writer backed by a growable `Vec<u8>`.
///
/// # Example
///
/// ```
/// use prp_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u32(0x0102_0304);
/// assert_eq!(writer.flush(), vec![0x04, 0x03, 0x02, 0x01]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Drops everything written so far.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the written bytes and leaves the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.bytes.push(val);
    }

    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.bytes.push(val as u8);
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.bytes.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes raw bytes.
    pub fn buf(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Writes a `u32` length prefix followed by the UTF-8 bytes.
    pub fn str32(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.buf(s.as_bytes());
    }

    /// Writes the UTF-8 bytes followed by a NUL terminator.
    pub fn cstr(&mut self, s: &str) {
        self.buf(s.as_bytes());
        self.u8(0);
    }

    /// Overwrites a previously written `u32` at `offset`.
    ///
    /// Used to back-patch length and offset fields once the size of the
    /// following region is known. The slot must already be written.
    pub fn patch_u32(&mut self, offset: usize, val: u32) -> Result<(), BufferError> {
        let have = self.bytes.len().saturating_sub(offset);
        let dst = offset
            .checked_add(4)
            .and_then(|end| self.bytes.get_mut(offset..end))
            .ok_or(BufferError::EndOfBuffer {
                offset,
                need: 4,
                have,
            })?;
        dst.copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
}
