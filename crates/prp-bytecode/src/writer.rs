//! Whole-file writer facade.

use prp_buffers::Writer;
use tracing::{debug, instrument};

use crate::codec::{write_instructions, Strings};
use crate::error::{PrpError, Region, Result};
use crate::header::{Header, HeaderFlags, HEADER_SIZE};
use crate::instruction::{Instruction, Operand};
use crate::token_table::TokenTable;
use crate::zdefs::ZDefinitions;

/// Produces a PRP buffer from definitions and instructions.
///
/// With [`HeaderFlags::TOKEN_TABLE`] set, the token table is built from every
/// string the definitions and instructions reference, in order of first use.
///
/// ```
/// use prp_bytecode::{Instruction, PrpReader, PrpWriter};
///
/// let bytes = PrpWriter::new()
///     .object_count(0)
///     .instructions(vec![Instruction::string("Hitman"), Instruction::end_of_stream()])
///     .write()
///     .unwrap();
/// let reader = PrpReader::from_bytes(&bytes).unwrap();
/// assert_eq!(reader.instructions()[0].as_str(), Some("Hitman"));
/// ```
#[derive(Debug, Clone)]
pub struct PrpWriter {
    flags: HeaderFlags,
    definitions: ZDefinitions,
    object_count: u32,
    instructions: Vec<Instruction>,
}

impl Default for PrpWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrpWriter {
    pub fn new() -> Self {
        Self {
            flags: HeaderFlags::TOKEN_TABLE,
            definitions: ZDefinitions::new(),
            object_count: 0,
            instructions: Vec::new(),
        }
    }

    pub fn flags(mut self, flags: HeaderFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn definitions(mut self, definitions: ZDefinitions) -> Self {
        self.definitions = definitions;
        self
    }

    pub fn object_count(mut self, count: u32) -> Self {
        self.object_count = count;
        self
    }

    pub fn instructions(mut self, instructions: Vec<Instruction>) -> Self {
        self.instructions = instructions;
        self
    }

    #[instrument(name = "prp::writer::write", level = "debug", skip_all)]
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut header = Header::new(self.flags);
        let tokens = if header.has_token_table() {
            collect_tokens(&self.definitions, &self.instructions)
        } else {
            TokenTable::new()
        };
        header.total_keys = tokens.len() as u32;

        // Body first, so a bad string is reported against its instruction.
        let strings = Strings::for_header(&header, &tokens);
        let mut body = Writer::with_capacity(self.instructions.len() * 5);
        self.definitions.write(&mut body, strings)?;
        body.u32(self.object_count);
        write_instructions(&mut body, &self.instructions, strings)?;

        let mut writer = Writer::with_capacity(HEADER_SIZE + body.len());
        header.write(&mut writer);
        if header.has_token_table() {
            tokens.write(&mut writer)?;
        }
        let zdefs_offset = writer.len();
        // Offset of the zdefs field inside the header.
        writer
            .patch_u32(HEADER_SIZE - 4, zdefs_offset as u32)
            .map_err(|e| PrpError::from_buffer(e, Region::Header, None))?;
        writer.buf(body.as_slice());

        debug!(
            tokens = tokens.len(),
            definitions = self.definitions.len(),
            instructions = self.instructions.len(),
            bytes = writer.len(),
            "prp buffer written"
        );
        Ok(writer.flush())
    }
}

/// Builds a token table holding every string referenced by `definitions`
/// and `instructions`.
pub fn collect_tokens(definitions: &ZDefinitions, instructions: &[Instruction]) -> TokenTable {
    let mut tokens = TokenTable::new();
    for text in definitions.strings() {
        tokens.add(text);
    }
    for instruction in instructions {
        if let Some(name) = &instruction.name {
            tokens.add(name.as_str());
        }
        match &instruction.operand {
            Operand::StringRef(s) => {
                tokens.add(s.as_str());
            }
            Operand::StringArray(items) => {
                for item in items {
                    tokens.add(item.as_str());
                }
            }
            _ => {}
        }
    }
    tokens
}
