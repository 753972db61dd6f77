//! PRP bytecode: the binary property format a game engine uses to persist
//! per-object property trees.
//!
//! # Overview
//!
//! - [`TokenTable`] - deduplicated string pool referenced by index
//! - [`Opcode`], [`Instruction`] - the decoded instruction model
//! - [`codec`] - instruction region `parse`/`serialize`
//! - [`ZDefinitions`] - named global constants
//! - [`PrpReader`], [`PrpWriter`] - whole-file facades
//!
//! # Example
//!
//! ```
//! use prp_bytecode::{codec, Header, Instruction, Opcode, TokenTable};
//!
//! let tokens: TokenTable = ["ROOT", "Hitman"].into_iter().collect();
//! let data = [Opcode::String.as_u8(), 1, 0, 0, 0, Opcode::EndOfStream.as_u8()];
//! let instructions = codec::parse(&data, &Header::default(), &tokens).unwrap();
//! assert_eq!(instructions[0], Instruction::string("Hitman"));
//! assert_eq!(codec::serialize(&instructions, &Header::default(), &tokens).unwrap(), data);
//! ```

pub mod codec;
mod error;
mod header;
mod instruction;
mod opcode;
mod options;
mod reader;
mod token_table;
mod writer;
mod zdefs;

pub use error::{PrpError, Region, Result};
pub use header::{Header, HeaderFlags, HEADER_SIZE, MAGIC};
pub use instruction::{Instruction, Operand};
pub use opcode::{Opcode, OperandKind, NAMED_BIT, OPCODE_RANGE_END};
pub use options::ReaderOptions;
pub use reader::PrpReader;
pub use token_table::TokenTable;
pub use writer::{collect_tokens, PrpWriter};
pub use zdefs::{ZDefinition, ZDefinitionType, ZDefinitionValue, ZDefinitions};
