//! Type definitions and instruction matching.
//!
//! - `Type` enum: the closed union of shapes
//! - shape structs in [`classes`]
//! - [`TypeRef`] / [`ValueView`]: references between types

pub mod classes;
mod kind;
mod matcher;
mod type_ref;

pub use classes::*;
pub use kind::TypeKind;
pub use type_ref::{TypeId, TypeRef, ValueView, OPCODE_PREFIX};

use prp_bytecode::Instruction;

use crate::error::TypeError;
use crate::registry::TypeRegistry;
use crate::value::Value;
use matcher::Matcher;

/// Bound on alias chains and parent chains. Following either consumes no
/// instructions, so a cycle would otherwise never terminate.
pub const MAX_DEPTH: usize = 64;

/// Bound on objects nested inside one matched value. Each level consumes an
/// opener, so this only limits stack use on pathological input.
pub const MAX_NESTING: usize = 256;

/// Outcome of [`Type::verify`]. On failure `rest` is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verified<'a> {
    pub ok: bool,
    pub rest: &'a [Instruction],
}

impl<'a> Verified<'a> {
    fn accept(rest: &'a [Instruction]) -> Self {
        Self { ok: true, rest }
    }

    fn reject() -> Self {
        Self { ok: false, rest: &[] }
    }
}

/// Outcome of [`Type::map`]. On failure `value` is `None` and `rest` is the
/// input slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped<'a> {
    pub value: Option<Value>,
    pub rest: &'a [Instruction],
}

/// The unified enum covering every type shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Alias(AliasType),
    Enum(EnumType),
    Bitfield(BitfieldType),
    RawData(RawDataType),
    Array(ArrayType),
    Container(ContainerType),
    Complex(ComplexType),
}

impl Type {
    pub fn name(&self) -> &str {
        match self {
            Self::Alias(t) => &t.name,
            Self::Enum(t) => &t.name,
            Self::Bitfield(t) => &t.name,
            Self::RawData(t) => &t.name,
            Self::Array(t) => &t.name,
            Self::Container(t) => &t.name,
            Self::Complex(t) => &t.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Alias(t) => t.kind(),
            Self::Enum(t) => t.kind(),
            Self::Bitfield(t) => t.kind(),
            Self::RawData(t) => t.kind(),
            Self::Array(t) => t.kind(),
            Self::Container(t) => t.kind(),
            Self::Complex(t) => t.kind(),
        }
    }

    /// Whether every reference this type holds is resolved.
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Alias(t) => t.target.is_resolved(),
            Self::Complex(t) => {
                t.parent.as_ref().map_or(true, TypeRef::is_resolved)
                    && t.fields.iter().all(ValueView::is_resolved)
            }
            _ => true,
        }
    }

    /// Resolved target of an alias.
    pub fn target(&self) -> Result<&TypeRef, TypeError> {
        match self {
            Self::Alias(t) if t.target.is_resolved() => Ok(&t.target),
            Self::Alias(t) => Err(TypeError::Unresolved(match &t.target {
                TypeRef::Pending(name) => name.clone(),
                _ => t.name.clone(),
            })),
            other => Err(TypeError::Unimplemented {
                kind: other.kind(),
                operation: "target",
            }),
        }
    }

    pub fn verify<'a>(&self, registry: &TypeRegistry, slice: &'a [Instruction]) -> Verified<'a> {
        match Matcher::new(registry, false).whole(self, slice) {
            Some(m) => Verified::accept(&slice[m.consumed..]),
            None => Verified::reject(),
        }
    }

    pub fn map<'a>(&self, registry: &TypeRegistry, slice: &'a [Instruction]) -> Mapped<'a> {
        Self::mapped(Matcher::new(registry, true).whole(self, slice), slice)
    }

    /// Like [`verify`](Self::verify) for an object whose `BeginObject` was
    /// already consumed. Equal to `verify` for non-complex shapes.
    pub fn verify_body<'a>(
        &self,
        registry: &TypeRegistry,
        slice: &'a [Instruction],
    ) -> Verified<'a> {
        match Matcher::new(registry, false).body(self, slice) {
            Some(m) => Verified::accept(&slice[m.consumed..]),
            None => Verified::reject(),
        }
    }

    pub fn map_body<'a>(&self, registry: &TypeRegistry, slice: &'a [Instruction]) -> Mapped<'a> {
        Self::mapped(Matcher::new(registry, true).body(self, slice), slice)
    }

    /// Mutable references held by this type, for resolution.
    pub(crate) fn refs_mut(&mut self) -> Vec<&mut TypeRef> {
        match self {
            Self::Alias(t) => vec![&mut t.target],
            Self::Complex(t) => t
                .parent
                .iter_mut()
                .chain(t.fields.iter_mut().map(|f| &mut f.type_ref))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn mapped<'a>(matched: Option<matcher::Matched>, slice: &'a [Instruction]) -> Mapped<'a> {
        match matched {
            Some(m) => Mapped {
                value: m.value,
                rest: &slice[m.consumed..],
            },
            None => Mapped { value: None, rest: slice },
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}
