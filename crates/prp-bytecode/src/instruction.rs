//! The atomic decoded unit: an opcode plus its operand.

use serde_json::{json, Value as JsonValue};

use crate::error::{PrpError, Region, Result};
use crate::opcode::{Opcode, OperandKind};
use crate::token_table::TokenTable;

/// Operand payload. Scalars are stored widened.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Bool(bool),
    /// Char, Int8/16/32, bit masks and array/container capacities.
    Int(i64),
    /// Float32 and Float64.
    Float(f64),
    /// Resolved token text of a Reference or String.
    StringRef(String),
    RawData(Vec<u8>),
    StringArray(Vec<String>),
}

impl Operand {
    fn fits(&self, kind: OperandKind) -> bool {
        match (kind, self) {
            (OperandKind::None, Operand::None) => true,
            (OperandKind::Bool, Operand::Bool(_)) => true,
            (OperandKind::Char, Operand::Int(v)) => (0..=u8::MAX as i64).contains(v),
            (OperandKind::Int8, Operand::Int(v)) => (i8::MIN as i64..=i8::MAX as i64).contains(v),
            (OperandKind::Int16, Operand::Int(v)) => {
                (i16::MIN as i64..=i16::MAX as i64).contains(v)
            }
            (OperandKind::Int32, Operand::Int(v)) => {
                (i32::MIN as i64..=i32::MAX as i64).contains(v)
            }
            (OperandKind::Capacity | OperandKind::Mask, Operand::Int(v)) => {
                (0..=u32::MAX as i64).contains(v)
            }
            (OperandKind::Float32 | OperandKind::Float64, Operand::Float(_)) => true,
            (OperandKind::StringRef, Operand::StringRef(_)) => true,
            (OperandKind::RawData, Operand::RawData(_)) => true,
            (OperandKind::StringArray, Operand::StringArray(_)) => true,
            _ => false,
        }
    }
}

/// A decoded instruction.
///
/// Named opcodes carry the field name in `name`; anonymous opcodes never do.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub name: Option<String>,
    pub operand: Operand,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand: Operand) -> Self {
        Self {
            opcode,
            name: None,
            operand,
        }
    }

    /// Builds a named instruction; `opcode` is promoted to its named form.
    /// End markers have no named form and stay anonymous.
    pub fn named(opcode: Opcode, name: impl Into<String>, operand: Operand) -> Self {
        match opcode.to_named() {
            Some(named) => Self {
                opcode: named,
                name: Some(name.into()),
                operand,
            },
            None => Self::new(opcode, operand),
        }
    }

    /// An instruction without operand (structural markers).
    pub fn marker(opcode: Opcode) -> Self {
        Self::new(opcode, Operand::None)
    }

    pub fn begin_object() -> Self {
        Self::marker(Opcode::BeginObject)
    }

    pub fn end_object() -> Self {
        Self::marker(Opcode::EndObject)
    }

    pub fn end_of_stream() -> Self {
        Self::marker(Opcode::EndOfStream)
    }

    pub fn array(capacity: u32) -> Self {
        Self::new(Opcode::Array, Operand::Int(capacity as i64))
    }

    pub fn container(capacity: u32) -> Self {
        Self::new(Opcode::Container, Operand::Int(capacity as i64))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Opcode::Bool, Operand::Bool(value))
    }

    pub fn int32(value: i32) -> Self {
        Self::new(Opcode::Int32, Operand::Int(value as i64))
    }

    pub fn float32(value: f32) -> Self {
        Self::new(Opcode::Float32, Operand::Float(value as f64))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::new(Opcode::String, Operand::StringRef(text.into()))
    }

    pub fn string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            Opcode::StringArray,
            Operand::StringArray(items.into_iter().map(Into::into).collect()),
        )
    }

    pub fn raw_data(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Opcode::RawData, Operand::RawData(bytes.into()))
    }

    /// Builds a string-reference instruction from a token index, rejecting
    /// indices outside the table.
    pub fn from_token(opcode: Opcode, token: u32, tokens: &TokenTable) -> Result<Self> {
        if opcode.operand_kind() != OperandKind::StringRef {
            return Err(PrpError::OperandMismatch { index: 0, opcode });
        }
        let text = tokens.resolve(token, Region::Instructions, None)?;
        Ok(Self::new(opcode, Operand::StringRef(text.to_owned())))
    }

    /// Whether the operand shape (and range) matches the opcode, and the
    /// name presence matches the opcode form.
    pub fn is_operand_valid(&self) -> bool {
        !self.opcode.is_error()
            && self.opcode.is_named() == self.name.is_some()
            && self.operand.fits(self.opcode.operand_kind())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.operand {
            Operand::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.operand {
            Operand::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.operand {
            Operand::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.operand {
            Operand::StringRef(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        match &self.operand {
            Operand::RawData(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match &self.operand {
            Operand::StringArray(items) => Some(items),
            _ => None,
        }
    }

    /// Capacity declared by an array or container header.
    pub fn capacity(&self) -> Option<usize> {
        match self.opcode.operand_kind() {
            OperandKind::Capacity => self.as_int().map(|v| v as usize),
            _ => None,
        }
    }

    /// Operand as JSON. Structural markers map to `null`.
    pub fn operand_json(&self) -> JsonValue {
        match &self.operand {
            Operand::None => JsonValue::Null,
            Operand::Bool(v) => json!(v),
            Operand::Int(v) => json!(v),
            Operand::Float(v) => json!(v),
            Operand::StringRef(s) => json!(s),
            Operand::RawData(bytes) => json!(bytes),
            Operand::StringArray(items) => json!(items),
        }
    }

    /// Full JSON view: `{"op": ..., "name": ..., "value": ...}`.
    pub fn to_json(&self) -> JsonValue {
        let mut out = serde_json::Map::new();
        out.insert("op".into(), json!(self.opcode.name()));
        if let Some(name) = &self.name {
            out.insert("name".into(), json!(name));
        }
        if self.operand != Operand::None {
            out.insert("value".into(), self.operand_json());
        }
        JsonValue::Object(out)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode)?;
        if let Some(name) = &self.name {
            write!(f, " {name:?}")?;
        }
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Bool(v) => write!(f, " {v}"),
            Operand::Int(v) => write!(f, " {v}"),
            Operand::Float(v) => write!(f, " {v}"),
            Operand::StringRef(s) => write!(f, " {s:?}"),
            Operand::RawData(b) => write!(f, " <{} bytes>", b.len()),
            Operand::StringArray(items) => write!(f, " {items:?}"),
        }
    }
}
