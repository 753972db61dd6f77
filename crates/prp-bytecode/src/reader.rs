//! Whole-file reader facade.

use prp_buffers::Reader;
use tracing::{debug, instrument};

use crate::codec::{parse_with_options, Strings};
use crate::error::{PrpError, Region, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::instruction::Instruction;
use crate::options::ReaderOptions;
use crate::token_table::TokenTable;
use crate::zdefs::ZDefinitions;

/// A fully decoded PRP file.
#[derive(Debug, Clone, PartialEq)]
pub struct PrpReader {
    header: Header,
    tokens: TokenTable,
    definitions: ZDefinitions,
    object_count: u32,
    instructions: Vec<Instruction>,
}

impl PrpReader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::with_options(data, &ReaderOptions::default())
    }

    /// Decodes every region in file order. The header must be valid before
    /// anything else is read.
    #[instrument(name = "prp::reader::read", level = "debug", skip_all, fields(len = data.len()))]
    pub fn with_options(data: &[u8], options: &ReaderOptions) -> Result<Self> {
        let mut reader = Reader::new(data);
        let header = Header::read(&mut reader)?;
        if !header.is_valid() {
            return Err(PrpError::InvalidHeader);
        }
        debug_assert_eq!(reader.position(), HEADER_SIZE);

        let tokens = if header.has_token_table() {
            let tokens = TokenTable::read(&mut reader)?;
            if tokens.len() as u32 != header.total_keys {
                return Err(PrpError::TokenCountMismatch {
                    declared: header.total_keys,
                    actual: tokens.len() as u32,
                });
            }
            tokens
        } else {
            TokenTable::new()
        };
        debug!(tokens = tokens.len(), "token table decoded");

        let zdefs_offset = header.zdefs_offset as usize;
        if zdefs_offset < reader.position() {
            return Err(PrpError::BadOffset {
                region: Region::ZDefinitions,
                offset: zdefs_offset,
            });
        }
        reader.seek(zdefs_offset).map_err(|_| PrpError::BadOffset {
            region: Region::ZDefinitions,
            offset: zdefs_offset,
        })?;
        let strings = Strings::for_header(&header, &tokens);
        let definitions = ZDefinitions::read(&mut reader, strings)?;

        let object_count = reader
            .u32()
            .map_err(|e| PrpError::from_buffer(e, Region::Instructions, None))?;
        let instructions =
            parse_with_options(&data[reader.position()..], &header, &tokens, options)?;

        Ok(Self {
            header,
            tokens,
            definitions,
            object_count,
            instructions,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn token_table(&self) -> &TokenTable {
        &self.tokens
    }

    pub fn definitions(&self) -> &ZDefinitions {
        &self.definitions
    }

    /// Number of scene objects the instruction stream describes.
    pub fn object_count(&self) -> u32 {
        self.object_count
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }
}
