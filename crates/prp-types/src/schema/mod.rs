//! JSON type declarations.
//!
//! One object per declared type, discriminated by `kind`:
//!
//! ```json
//! { "name": "ZGEOM", "kind": "Complex", "parent": "ZBase",
//!   "allowUnexposedInstructions": true,
//!   "fields": [ { "name": "m_Name", "type": "PRPOpCode.String" } ] }
//! ```

use prp_bytecode::Opcode;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::type_def::{
    AliasType, ArrayType, BitfieldType, ComplexType, ContainerType, EnumEntry, EnumType,
    RawDataType, Type, TypeKind, TypeRef, ValueView, OPCODE_PREFIX,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumEntryDecl {
    pub key: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    /// Missing type leaves the field unset.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// A declared type as it appears in the schema JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Enum entries or bitfield options.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EnumEntryDecl>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDecl>>,
    #[serde(default)]
    pub allow_unexposed_instructions: bool,
}

impl TypeDeclaration {
    pub fn type_kind(&self) -> Result<TypeKind, RegistryError> {
        TypeKind::parse(&self.kind).ok_or_else(|| RegistryError::UnknownKind {
            name: self.name.clone(),
            kind: self.kind.clone(),
        })
    }

    /// Builds the type with every reference left pending.
    pub fn build(&self) -> Result<Type, RegistryError> {
        let name = self.name.clone();
        Ok(match self.type_kind()? {
            TypeKind::Alias => {
                let target = self.required(self.alias.as_ref(), "alias")?;
                Type::Alias(AliasType::new(name, TypeRef::parse(target)))
            }
            TypeKind::Enum => Type::Enum(EnumType::new(name, self.enum_entries()?)),
            TypeKind::Bitfield => Type::Bitfield(BitfieldType::new(name, self.enum_entries()?)),
            TypeKind::RawData => Type::RawData(RawDataType::new(name)),
            TypeKind::Array => {
                let entry_type = self.required(self.entry_type.as_ref(), "entryType")?;
                let count = *self.required(self.count.as_ref(), "count")?;
                Type::Array(ArrayType::new(
                    name,
                    self.opcode(entry_type)?,
                    count as usize,
                ))
            }
            TypeKind::Container => Type::Container(ContainerType::new(name)),
            TypeKind::Complex => {
                let mut ty =
                    ComplexType::new(name).allow_unexposed(self.allow_unexposed_instructions);
                ty.parent = self.parent.as_deref().map(TypeRef::parse);
                ty.fields = self
                    .fields
                    .iter()
                    .flatten()
                    .map(|f| {
                        ValueView::new(
                            f.name.clone(),
                            f.type_name.as_deref().map_or(TypeRef::Unset, TypeRef::parse),
                        )
                    })
                    .collect();
                Type::Complex(ty)
            }
        })
    }

    fn required<'a, T>(
        &self,
        value: Option<&'a T>,
        field: &'static str,
    ) -> Result<&'a T, RegistryError> {
        value.ok_or_else(|| RegistryError::MissingField {
            name: self.name.clone(),
            field,
        })
    }

    fn enum_entries(&self) -> Result<Vec<EnumEntry>, RegistryError> {
        Ok(self
            .required(self.entries.as_ref(), "enum")?
            .iter()
            .map(|e| EnumEntry::new(e.key.clone(), e.value))
            .collect())
    }

    /// Element opcode, bare (`Float32`) or prefixed (`PRPOpCode.Float32`).
    fn opcode(&self, text: &str) -> Result<Opcode, RegistryError> {
        let bare = text.strip_prefix(OPCODE_PREFIX).unwrap_or(text);
        Opcode::from_name(bare)
            .filter(|op| !op.is_error())
            .ok_or_else(|| RegistryError::UnknownOpcode {
                name: self.name.clone(),
                opcode: text.to_owned(),
            })
    }
}
