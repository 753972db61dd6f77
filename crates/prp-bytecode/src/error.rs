use prp_buffers::BufferError;
use thiserror::Error;

use crate::opcode::Opcode;
use crate::zdefs::ZDefinitionType;

/// File region a structural error was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Header,
    TokenTable,
    ZDefinitions,
    Instructions,
    Unknown,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "HEADER",
            Self::TokenTable => "TOKEN_TABLE",
            Self::ZDefinitions => "ZDEFINITIONS",
            Self::Instructions => "INSTRUCTIONS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural errors raised while reading or writing a PRP buffer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrpError {
    #[error("invalid PRP header")]
    InvalidHeader,

    #[error("unexpected end of {region} region at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        region: Region,
        index: Option<usize>,
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("invalid UTF-8 string in {region} region at offset {offset:#x}")]
    InvalidString {
        region: Region,
        index: Option<usize>,
        offset: usize,
    },

    #[error("{region} region offset {offset:#x} is outside the buffer")]
    BadOffset { region: Region, offset: usize },

    #[error("bad opcode byte {byte:#04x} ({opcode}) at instruction {index}")]
    BadOpcode {
        index: usize,
        byte: u8,
        opcode: Opcode,
    },

    #[error("token index {token} out of range in {region} region ({count} tokens)")]
    TokenOutOfRange {
        region: Region,
        index: Option<usize>,
        token: u32,
        count: usize,
    },

    #[error("string {text:?} is not in the token table")]
    UnknownToken {
        region: Region,
        index: Option<usize>,
        text: String,
    },

    #[error("string {text:?} contains NUL and cannot be stored as a token")]
    NulInToken {
        region: Region,
        index: Option<usize>,
        text: String,
    },

    #[error("token table declares {declared} keys but holds {actual}")]
    TokenCountMismatch { declared: u32, actual: u32 },

    #[error("unknown z-definition type flags {flags:#04x} for {name:?}")]
    UnknownDefinitionType { name: String, flags: u8 },

    #[error("z-definition {name:?} value does not match declared type {declared:?}")]
    DefinitionMismatch {
        name: String,
        declared: ZDefinitionType,
    },

    #[error("operand of instruction {index} does not match opcode {opcode}")]
    OperandMismatch { index: usize, opcode: Opcode },

    #[error("instruction stream ended without EndOfStream")]
    MissingEndOfStream,

    #[error("{count} trailing bytes after EndOfStream")]
    TrailingBytes { count: usize },

    #[error("instruction limit {limit} exceeded")]
    TooManyInstructions { limit: usize },
}

impl PrpError {
    /// Lifts a buffer failure into a region-tagged structural error.
    pub(crate) fn from_buffer(err: BufferError, region: Region, index: Option<usize>) -> Self {
        match err {
            BufferError::EndOfBuffer { offset, need, have } => Self::UnexpectedEof {
                region,
                index,
                offset,
                need,
                have,
            },
            BufferError::InvalidUtf8 { offset } => Self::InvalidString {
                region,
                index,
                offset,
            },
        }
    }

    pub fn region(&self) -> Region {
        match self {
            Self::InvalidHeader => Region::Header,
            Self::UnexpectedEof { region, .. }
            | Self::InvalidString { region, .. }
            | Self::BadOffset { region, .. }
            | Self::TokenOutOfRange { region, .. }
            | Self::UnknownToken { region, .. }
            | Self::NulInToken { region, .. } => *region,
            Self::TokenCountMismatch { .. } => Region::TokenTable,
            Self::UnknownDefinitionType { .. } | Self::DefinitionMismatch { .. } => {
                Region::ZDefinitions
            }
            Self::BadOpcode { .. }
            | Self::OperandMismatch { .. }
            | Self::MissingEndOfStream
            | Self::TrailingBytes { .. }
            | Self::TooManyInstructions { .. } => Region::Instructions,
        }
    }

    /// Index of the offending instruction, when the failure is tied to one.
    pub fn instruction_index(&self) -> Option<usize> {
        match self {
            Self::UnexpectedEof { index, .. }
            | Self::InvalidString { index, .. }
            | Self::TokenOutOfRange { index, .. }
            | Self::UnknownToken { index, .. }
            | Self::NulInToken { index, .. } => *index,
            Self::BadOpcode { index, .. } | Self::OperandMismatch { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrpError>;
