//! Little-endian byte cursor and writer for PRP files.
//!
//! [`Reader`] borrows a byte slice and reports every overrun as a
//! [`BufferError`] carrying the failing offset, so decoders can attach their
//! own region to it. [`Writer`] appends to a `Vec<u8>` and can back-patch
//! `u32` slots once their values are known.
//!
//! ```
//! use prp_buffers::{Reader, Writer};
//!
//! let mut out = Writer::new();
//! out.u32(0);
//! out.cstr("ZGEOM");
//! out.patch_u32(0, 0x1C).unwrap();
//! let bytes = out.flush();
//!
//! let mut input = Reader::new(&bytes);
//! assert_eq!(input.u32().unwrap(), 0x1C);
//! assert_eq!(input.cstr().unwrap(), "ZGEOM");
//! assert!(input.is_eof());
//! ```

use std::error::Error;
use std::fmt;

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// A read that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Fewer than `need` bytes left at `offset`.
    EndOfBuffer {
        offset: usize,
        need: usize,
        have: usize,
    },
    /// Invalid UTF-8 sequence starting at `offset`.
    InvalidUtf8 { offset: usize },
}

impl BufferError {
    /// Offset of the read that failed.
    pub fn offset(&self) -> usize {
        match self {
            BufferError::EndOfBuffer { offset, .. } => *offset,
            BufferError::InvalidUtf8 { offset } => *offset,
        }
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::EndOfBuffer { offset, need, have } => write!(
                f,
                "end of buffer at offset {offset:#x} (need {need} bytes, have {have})"
            ),
            BufferError::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 sequence at offset {offset:#x}")
            }
        }
    }
}

impl Error for BufferError {}
