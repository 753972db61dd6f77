use std::collections::HashMap;

use prp_bytecode::Opcode;

/// Prefix marking a reference to a raw opcode domain rather than a type.
pub const OPCODE_PREFIX: &str = "PRPOpCode.";

/// Handle of a type inside a [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resolution state of a reference to another type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeRef {
    #[default]
    Unset,
    /// Named type not (yet) found in the registry.
    Pending(String),
    Resolved(TypeId),
    /// Raw opcode domain: exactly one instruction of this opcode, either form.
    Opcode(Opcode),
}

impl TypeRef {
    /// Parses a declaration reference. `PRPOpCode.<Name>` with a known opcode
    /// becomes [`TypeRef::Opcode`]; anything else is a pending type name.
    pub fn parse(text: &str) -> Self {
        match text.strip_prefix(OPCODE_PREFIX).and_then(Opcode::from_name) {
            Some(opcode) if !opcode.is_error() => Self::Opcode(opcode),
            _ => Self::Pending(text.to_owned()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Opcode(_))
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Self::Resolved(id) => Some(*id),
            _ => None,
        }
    }

    /// Resolves a pending name against `index`. Returns whether the
    /// reference is resolved afterwards.
    pub(crate) fn resolve(&mut self, index: &HashMap<String, TypeId>) -> bool {
        if let Self::Pending(name) = self {
            if let Some(id) = index.get(name.as_str()) {
                *self = Self::Resolved(*id);
            }
        }
        self.is_resolved()
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => f.write_str("<unset>"),
            Self::Pending(name) => write!(f, "{name}?"),
            Self::Resolved(id) => write!(f, "#{}", id.index()),
            Self::Opcode(op) => write!(f, "{OPCODE_PREFIX}{op}"),
        }
    }
}

/// A named field of a complex type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueView {
    pub name: String,
    pub type_ref: TypeRef,
    /// Complex type declaring the field.
    pub owner: Option<TypeId>,
}

impl ValueView {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            owner: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.type_ref.is_resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_opcode_and_names() {
        assert_eq!(
            TypeRef::parse("PRPOpCode.String"),
            TypeRef::Opcode(Opcode::String)
        );
        assert_eq!(
            TypeRef::parse("PRPOpCode.Bogus"),
            TypeRef::Pending("PRPOpCode.Bogus".into())
        );
        assert_eq!(TypeRef::parse("SMatrix33"), TypeRef::Pending("SMatrix33".into()));
    }

    #[test]
    fn resolve_against_index() {
        let mut index = HashMap::new();
        index.insert("A".to_owned(), TypeId::from_index(3));

        let mut found = TypeRef::parse("A");
        assert!(found.resolve(&index));
        assert_eq!(found.type_id(), Some(TypeId::from_index(3)));

        let mut missing = TypeRef::parse("B");
        assert!(!missing.resolve(&index));
        assert!(!TypeRef::Unset.is_resolved());
        assert!(TypeRef::Opcode(Opcode::Int32).is_resolved());
    }
}
