//! The seven type shapes.
//!
//! Each struct holds the declared data of one shape; matching against
//! instructions lives in the private `matcher` module.

use prp_bytecode::Opcode;

use super::kind::TypeKind;
use super::type_ref::{TypeRef, ValueView};

// -------------------------------------------------------------------------
// AliasType

/// Redirects to another type or to a raw opcode domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasType {
    pub name: String,
    pub target: TypeRef,
}

impl AliasType {
    pub fn new(name: impl Into<String>, target: TypeRef) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
    pub fn kind(&self) -> TypeKind {
        TypeKind::Alias
    }
}

// -------------------------------------------------------------------------
// EnumType

/// One `{name, value}` entry of an enum or bitfield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    pub name: String,
    pub value: i64,
}

impl EnumEntry {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub entries: Vec<EnumEntry>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, entries: Vec<EnumEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }
    pub fn kind(&self) -> TypeKind {
        TypeKind::Enum
    }

    pub fn entry(&self, name: &str) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Entry name for a numeric value.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.name.as_str())
    }
}

// -------------------------------------------------------------------------
// BitfieldType

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitfieldType {
    pub name: String,
    pub options: Vec<EnumEntry>,
}

impl BitfieldType {
    pub fn new(name: impl Into<String>, options: Vec<EnumEntry>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
    pub fn kind(&self) -> TypeKind {
        TypeKind::Bitfield
    }

    pub fn contains(&self, option: &str) -> bool {
        self.options.iter().any(|o| o.name == option)
    }

    /// Mask of the named options, or `None` if one is not declared.
    pub fn mask_of<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Option<i64> {
        names.into_iter().try_fold(0, |acc, name| {
            self.options
                .iter()
                .find(|o| o.name == name)
                .map(|o| acc | o.value)
        })
    }

    /// Names of the options set in `mask`, in declaration order.
    pub fn names_of(&self, mask: i64) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| o.value != 0 && mask & o.value == o.value)
            .map(|o| o.name.as_str())
            .collect()
    }
}

// -------------------------------------------------------------------------
// RawDataType

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataType {
    pub name: String,
}

impl RawDataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
    pub fn kind(&self) -> TypeKind {
        TypeKind::RawData
    }
}

// -------------------------------------------------------------------------
// ArrayType

/// Fixed-capacity array of one element opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub name: String,
    pub element: Opcode,
    pub capacity: usize,
}

impl ArrayType {
    pub fn new(name: impl Into<String>, element: Opcode, capacity: usize) -> Self {
        Self {
            name: name.into(),
            element,
            capacity,
        }
    }
    pub fn kind(&self) -> TypeKind {
        TypeKind::Array
    }

    /// Instructions consumed by a matching slice (header included).
    pub fn span(&self) -> usize {
        self.capacity + 1
    }
}

// -------------------------------------------------------------------------
// ContainerType

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerType {
    pub name: String,
}

impl ContainerType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
    pub fn kind(&self) -> TypeKind {
        TypeKind::Container
    }
}

// -------------------------------------------------------------------------
// ComplexType

/// Record with ordered fields and an optional parent whose fields come first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexType {
    pub name: String,
    pub parent: Option<TypeRef>,
    pub fields: Vec<ValueView>,
    pub allow_unexposed_instructions: bool,
}

impl ComplexType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            allow_unexposed_instructions: false,
        }
    }
    pub fn kind(&self) -> TypeKind {
        TypeKind::Complex
    }

    pub fn parent(mut self, parent: TypeRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn field(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.fields.push(ValueView::new(name, type_ref));
        self
    }

    pub fn allow_unexposed(mut self, allow: bool) -> Self {
        self.allow_unexposed_instructions = allow;
        self
    }

    /// Own field by name (parent fields excluded).
    pub fn own_field(&self, name: &str) -> Option<&ValueView> {
        self.fields.iter().find(|f| f.name == name)
    }
}
