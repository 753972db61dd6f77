use prp_bytecode::Region;
use thiserror::Error;

use crate::type_def::TypeKind;

/// Failures while loading type declarations. A failing batch leaves the
/// registry untouched.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid type declaration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown type kind {kind:?} for {name:?}")]
    UnknownKind { name: String, kind: String },

    #[error("type {0:?} is declared more than once")]
    DuplicateType(String),

    #[error("type {name:?} is missing required field {field:?}")]
    MissingField { name: String, field: &'static str },

    #[error("type {name:?} names unknown opcode {opcode:?}")]
    UnknownOpcode { name: String, opcode: String },
}

/// Misuse of a type, as opposed to a shape mismatch (which is a plain
/// `ok == false` result).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("type reference {0:?} is unresolved")]
    Unresolved(String),

    #[error("{operation} is not implemented for {kind} types")]
    Unimplemented {
        kind: TypeKind,
        operation: &'static str,
    },
}

/// Failures while binding scene objects to a level's instruction stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("object {object_index}: expected BeginObject at instruction {instruction_index} ({region})")]
    BadInstruction {
        object_index: usize,
        instruction_index: usize,
        region: Region,
    },

    #[error("object {object_index}: no type registered for hash {hash:?}")]
    TypeNotFound { object_index: usize, hash: String },

    #[error("object {object_index}: instructions at {instruction_index} do not match type {type_name:?}")]
    MapFailed {
        object_index: usize,
        instruction_index: usize,
        type_name: String,
    },
}

impl SceneError {
    pub fn object_index(&self) -> usize {
        match self {
            Self::BadInstruction { object_index, .. }
            | Self::TypeNotFound { object_index, .. }
            | Self::MapFailed { object_index, .. } => *object_index,
        }
    }
}
