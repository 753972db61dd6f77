use prp_buffers::Writer;

use super::Strings;
use crate::error::{PrpError, Region, Result};
use crate::header::Header;
use crate::instruction::{Instruction, Operand};
use crate::opcode::OperandKind;
use crate::token_table::TokenTable;

/// Encodes instructions into an instruction region; the byte-exact inverse
/// of [`parse`](super::parse).
///
/// Fails when an operand does not fit its opcode or, in token mode, when a
/// string is missing from `tokens`.
pub fn serialize(
    instructions: &[Instruction],
    header: &Header,
    tokens: &TokenTable,
) -> Result<Vec<u8>> {
    let mut writer = Writer::with_capacity(instructions.len() * 5);
    write_instructions(&mut writer, instructions, Strings::for_header(header, tokens))?;
    Ok(writer.flush())
}

pub(crate) fn write_instructions(
    writer: &mut Writer,
    instructions: &[Instruction],
    strings: Strings<'_>,
) -> Result<()> {
    for (index, instruction) in instructions.iter().enumerate() {
        write_instruction(writer, instruction, index, strings)?;
    }
    Ok(())
}

fn write_instruction(
    writer: &mut Writer,
    instruction: &Instruction,
    index: usize,
    strings: Strings<'_>,
) -> Result<()> {
    let opcode = instruction.opcode;
    if opcode.is_error() {
        return Err(PrpError::BadOpcode {
            index,
            byte: opcode.as_u8(),
            opcode,
        });
    }
    if !instruction.is_operand_valid() {
        return Err(PrpError::OperandMismatch { index, opcode });
    }
    let string = |writer: &mut Writer, text: &str| {
        strings.write(writer, text, Region::Instructions, Some(index))
    };

    writer.u8(opcode.as_u8());
    if let Some(name) = &instruction.name {
        string(writer, name)?;
    }
    match (opcode.operand_kind(), &instruction.operand) {
        (OperandKind::None, _) => {}
        (OperandKind::Bool, Operand::Bool(v)) => writer.u8(*v as u8),
        (OperandKind::Char, Operand::Int(v)) => writer.u8(*v as u8),
        (OperandKind::Int8, Operand::Int(v)) => writer.i8(*v as i8),
        (OperandKind::Int16, Operand::Int(v)) => writer.i16(*v as i16),
        (OperandKind::Int32, Operand::Int(v)) => writer.i32(*v as i32),
        (OperandKind::Capacity | OperandKind::Mask, Operand::Int(v)) => writer.u32(*v as u32),
        (OperandKind::Float32, Operand::Float(v)) => writer.f32(*v as f32),
        (OperandKind::Float64, Operand::Float(v)) => writer.f64(*v),
        (OperandKind::StringRef, Operand::StringRef(s)) => string(writer, s)?,
        (OperandKind::RawData, Operand::RawData(bytes)) => {
            writer.u32(bytes.len() as u32);
            writer.buf(bytes);
        }
        (OperandKind::StringArray, Operand::StringArray(items)) => {
            writer.u32(items.len() as u32);
            for item in items {
                string(writer, item)?;
            }
        }
        _ => return Err(PrpError::OperandMismatch { index, opcode }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    #[test]
    fn encodes_named_int32() {
        let tokens: TokenTable = ["m_iCount"].into_iter().collect();
        let instr = Instruction::named(Opcode::Int32, "m_iCount", Operand::Int(-2));
        let data = serialize(&[instr], &Header::default(), &tokens).unwrap();
        assert_eq!(
            data,
            vec![0x29, 0, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff],
        );
    }

    #[test]
    fn missing_token_fails() {
        let tokens = TokenTable::new();
        let err = serialize(&[Instruction::string("x")], &Header::default(), &tokens).unwrap_err();
        assert_eq!(
            err,
            PrpError::UnknownToken {
                region: Region::Instructions,
                index: Some(0),
                text: "x".into()
            }
        );
    }

    #[test]
    fn inline_strings_without_token_table() {
        use crate::header::HeaderFlags;
        let header = Header::new(HeaderFlags::empty());
        let data = serialize(&[Instruction::string("ab")], &header, &TokenTable::new()).unwrap();
        assert_eq!(data, vec![0x0C, 2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn operand_mismatch_reports_index() {
        let tokens = TokenTable::new();
        let bad = Instruction::new(Opcode::Float32, Operand::Int(1));
        let err = serialize(&[Instruction::begin_object(), bad], &Header::default(), &tokens)
            .unwrap_err();
        assert_eq!(
            err,
            PrpError::OperandMismatch {
                index: 1,
                opcode: Opcode::Float32
            }
        );
    }
}
