//! Fixed-size PRP file header.

use prp_buffers::{Reader, Writer};

use crate::error::{PrpError, Region, Result};

/// Magic tag following the length byte at offset 0.
pub const MAGIC: &[u8; 14] = b"IOPacked v0.1\0";

/// Size in bytes of the encoded header.
pub const HEADER_SIZE: usize = 0x1C;

/// Header flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HeaderFlags(u32);

impl HeaderFlags {
    pub const RAW: Self = Self(0x1);
    pub const SAVE: Self = Self(0x2);
    pub const TOKEN_TABLE: Self = Self(0x8);

    const KNOWN: u32 = Self::RAW.0 | Self::SAVE.0 | Self::TOKEN_TABLE.0;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Whether every set bit is a known flag.
    pub const fn is_known(self) -> bool {
        self.0 & !Self::KNOWN == 0
    }
}

impl std::ops::BitOr for HeaderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Decoded header.
///
/// `is_valid()` must hold before any other region of the file is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    magic_ok: bool,
    pub raw_view: bool,
    pub flags: HeaderFlags,
    /// Number of tokens in the token table.
    pub total_keys: u32,
    /// Absolute offset of the Z-Definitions region.
    pub zdefs_offset: u32,
}

impl Default for Header {
    fn default() -> Self {
        Self::new(HeaderFlags::TOKEN_TABLE)
    }
}

impl Header {
    pub fn new(flags: HeaderFlags) -> Self {
        Self {
            magic_ok: true,
            raw_view: flags.contains(HeaderFlags::RAW),
            flags,
            total_keys: 0,
            zdefs_offset: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic_ok && self.flags.is_known()
    }

    /// Whether string references are token indices (as opposed to inline
    /// length-prefixed strings).
    pub fn has_token_table(&self) -> bool {
        self.flags.contains(HeaderFlags::TOKEN_TABLE)
    }

    /// Reads the header. A wrong magic does not fail here; it makes
    /// [`is_valid`](Self::is_valid) return `false`.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let eof = |e| PrpError::from_buffer(e, Region::Header, None);
        let magic_len = reader.u8().map_err(eof)?;
        let magic = reader.buf(MAGIC.len()).map_err(eof)?;
        let raw_view = reader.u8().map_err(eof)?;
        let flags = HeaderFlags::from_bits_retain(reader.u32().map_err(eof)?);
        let total_keys = reader.u32().map_err(eof)?;
        let zdefs_offset = reader.u32().map_err(eof)?;
        Ok(Self {
            magic_ok: magic_len as usize == MAGIC.len() && magic == MAGIC && raw_view <= 1,
            raw_view: raw_view != 0,
            flags,
            total_keys,
            zdefs_offset,
        })
    }

    pub fn write(&self, writer: &mut Writer) {
        writer.u8(MAGIC.len() as u8);
        writer.buf(MAGIC);
        writer.u8(self.raw_view as u8);
        writer.u32(self.flags.bits());
        writer.u32(self.total_keys);
        writer.u32(self.zdefs_offset);
    }
}
