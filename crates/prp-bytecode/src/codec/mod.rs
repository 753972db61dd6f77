//! ByteCode codec: raw instruction region <-> flat instruction sequence.
//!
//! Each instruction is one opcode byte, then (for named opcodes) a string
//! reference naming the field, then the operand the opcode implies:
//!
//! - scalars at their natural width, little-endian;
//! - string references as a `u32` token index, or inline as `u32 length +
//!   UTF-8` when the header carries no token table;
//! - raw data as `u32 length + bytes`;
//! - string arrays as `u32 count + count` string references.
//!
//! The codec does not care where named or anonymous forms appear; that is
//! decided by the type system.

mod decode;
mod encode;

pub use decode::{parse, parse_with_options};
pub use encode::serialize;
pub(crate) use encode::write_instructions;

use prp_buffers::{Reader, Writer};

use crate::error::{PrpError, Region, Result};
use crate::header::Header;
use crate::token_table::TokenTable;

/// How string references are stored in a buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Strings<'t> {
    Tokens(&'t TokenTable),
    Inline,
}

impl<'t> Strings<'t> {
    pub(crate) fn for_header(header: &Header, tokens: &'t TokenTable) -> Self {
        if header.has_token_table() {
            Self::Tokens(tokens)
        } else {
            Self::Inline
        }
    }

    pub(crate) fn read(
        &self,
        reader: &mut Reader<'_>,
        region: Region,
        index: Option<usize>,
    ) -> Result<String> {
        let eof = |e| PrpError::from_buffer(e, region, index);
        match self {
            Self::Tokens(tokens) => {
                let token = reader.u32().map_err(eof)?;
                Ok(tokens.resolve(token, region, index)?.to_owned())
            }
            Self::Inline => Ok(reader.str32().map_err(eof)?.to_owned()),
        }
    }

    pub(crate) fn write(
        &self,
        writer: &mut Writer,
        text: &str,
        region: Region,
        index: Option<usize>,
    ) -> Result<()> {
        match self {
            Self::Tokens(_) if text.contains('\0') => {
                return Err(PrpError::NulInToken {
                    region,
                    index,
                    text: text.to_owned(),
                });
            }
            Self::Tokens(tokens) => {
                let token = tokens.index_of(text).ok_or_else(|| PrpError::UnknownToken {
                    region,
                    index,
                    text: text.to_owned(),
                })?;
                writer.u32(token);
            }
            Self::Inline => writer.str32(text),
        }
        Ok(())
    }
}
