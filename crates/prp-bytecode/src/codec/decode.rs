use prp_buffers::Reader;
use tracing::{debug, instrument};

use super::Strings;
use crate::error::{PrpError, Region, Result};
use crate::header::Header;
use crate::instruction::{Instruction, Operand};
use crate::opcode::{Opcode, OperandKind};
use crate::options::ReaderOptions;
use crate::token_table::TokenTable;

/// Decodes an instruction region with default [`ReaderOptions`].
pub fn parse(buffer: &[u8], header: &Header, tokens: &TokenTable) -> Result<Vec<Instruction>> {
    parse_with_options(buffer, header, tokens, &ReaderOptions::default())
}

/// Decodes an instruction region.
///
/// Decoding stops after `EndOfStream`. A truncated operand fails with an
/// `INSTRUCTIONS` error carrying the index of the instruction being decoded.
#[instrument(name = "prp::codec::parse", level = "debug", skip_all, fields(len = buffer.len()))]
pub fn parse_with_options(
    buffer: &[u8],
    header: &Header,
    tokens: &TokenTable,
    options: &ReaderOptions,
) -> Result<Vec<Instruction>> {
    let mut reader = Reader::new(buffer);
    let decoder = InstructionDecoder {
        strings: Strings::for_header(header, tokens),
    };
    let mut out = Vec::new();
    let mut terminated = false;

    while !reader.is_eof() {
        let index = out.len();
        if let Some(limit) = options.max_instructions {
            if index >= limit {
                return Err(PrpError::TooManyInstructions { limit });
            }
        }
        let instruction = decoder.read(&mut reader, index)?;
        let is_end = instruction.opcode == Opcode::EndOfStream;
        out.push(instruction);
        if is_end {
            terminated = true;
            break;
        }
    }

    if terminated {
        let trailing = reader.remaining();
        if trailing > 0 && !options.allow_trailing_bytes {
            return Err(PrpError::TrailingBytes { count: trailing });
        }
    } else if options.require_end_of_stream {
        return Err(PrpError::MissingEndOfStream);
    }

    debug!(instructions = out.len(), "instruction region decoded");
    Ok(out)
}

struct InstructionDecoder<'t> {
    strings: Strings<'t>,
}

impl InstructionDecoder<'_> {
    fn read(&self, reader: &mut Reader<'_>, index: usize) -> Result<Instruction> {
        let eof = |e| PrpError::from_buffer(e, Region::Instructions, Some(index));
        let byte = reader.u8().map_err(eof)?;
        let opcode = Opcode::from_u8(byte);
        if opcode.is_error() {
            return Err(PrpError::BadOpcode {
                index,
                byte,
                opcode,
            });
        }
        let name = if opcode.is_named() {
            Some(self.string(reader, index)?)
        } else {
            None
        };
        let operand = match opcode.operand_kind() {
            OperandKind::None => Operand::None,
            OperandKind::Bool => Operand::Bool(reader.u8().map_err(eof)? != 0),
            OperandKind::Char => Operand::Int(reader.u8().map_err(eof)? as i64),
            OperandKind::Int8 => Operand::Int(reader.i8().map_err(eof)? as i64),
            OperandKind::Int16 => Operand::Int(reader.i16().map_err(eof)? as i64),
            OperandKind::Int32 => Operand::Int(reader.i32().map_err(eof)? as i64),
            OperandKind::Capacity | OperandKind::Mask => {
                Operand::Int(reader.u32().map_err(eof)? as i64)
            }
            OperandKind::Float32 => Operand::Float(reader.f32().map_err(eof)? as f64),
            OperandKind::Float64 => Operand::Float(reader.f64().map_err(eof)?),
            OperandKind::StringRef => Operand::StringRef(self.string(reader, index)?),
            OperandKind::RawData => {
                let len = reader.u32().map_err(eof)? as usize;
                Operand::RawData(reader.buf(len).map_err(eof)?.to_vec())
            }
            OperandKind::StringArray => {
                let count = reader.u32().map_err(eof)? as usize;
                // Each entry needs at least four bytes; reject absurd counts
                // before allocating.
                if count.saturating_mul(4) > reader.remaining() {
                    return Err(PrpError::UnexpectedEof {
                        region: Region::Instructions,
                        index: Some(index),
                        offset: reader.position(),
                        need: count.saturating_mul(4),
                        have: reader.remaining(),
                    });
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.string(reader, index)?);
                }
                Operand::StringArray(items)
            }
        };
        Ok(Instruction {
            opcode,
            name,
            operand,
        })
    }

    fn string(&self, reader: &mut Reader<'_>, index: usize) -> Result<String> {
        self.strings.read(reader, Region::Instructions, Some(index))
    }
}
