//! Value - the owned result of mapping instructions against a type.

use std::ops::{AddAssign, Range};

use prp_bytecode::Instruction;
use serde_json::{Map, Value as JsonValue};

use crate::registry::TypeRegistry;
use crate::type_def::{Type, TypeId, TypeRef, ValueView};

/// A mapped field. `range` indexes the owning [`Value`]'s instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueEntry {
    pub name: String,
    pub range: Range<usize>,
    /// Fields of the entry's own complex type, if any.
    pub views: Vec<ValueView>,
    pub entries: Vec<ValueEntry>,
}

impl ValueEntry {
    fn shift(&mut self, by: usize) {
        self.range = self.range.start + by..self.range.end + by;
        for entry in &mut self.entries {
            entry.shift(by);
        }
    }

    pub fn entry(&self, name: &str) -> Option<&ValueEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Value {
    type_id: Option<TypeId>,
    instructions: Vec<Instruction>,
    entries: Vec<ValueEntry>,
    views: Vec<ValueView>,
}

impl Value {
    pub fn new(type_id: Option<TypeId>) -> Self {
        Self {
            type_id,
            ..Default::default()
        }
    }

    pub fn from_instructions(type_id: Option<TypeId>, instructions: Vec<Instruction>) -> Self {
        Self {
            type_id,
            instructions,
            ..Default::default()
        }
    }

    pub(crate) fn with_views(type_id: Option<TypeId>, views: Vec<ValueView>) -> Self {
        Self {
            type_id,
            views,
            ..Default::default()
        }
    }

    /// Type the value was mapped against; `None` for raw opcode domains.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn entries(&self) -> &[ValueEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&ValueEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Instructions of a top-level field.
    pub fn field(&self, name: &str) -> Option<&[Instruction]> {
        self.entry(name)
            .and_then(|e| self.instructions.get(e.range.clone()))
    }

    pub fn views(&self) -> &[ValueView] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Appends `field` as a named entry; nested ranges are rebased.
    pub(crate) fn push_field(&mut self, name: &str, field: Value) {
        let start = self.instructions.len();
        let Value {
            instructions,
            mut entries,
            views,
            ..
        } = field;
        self.instructions.extend(instructions);
        for entry in &mut entries {
            entry.shift(start);
        }
        self.entries.push(ValueEntry {
            name: name.to_owned(),
            range: start..self.instructions.len(),
            views,
            entries,
        });
    }

    /// Appends another value's instructions, entries and views.
    pub fn merge(&mut self, other: Value) {
        let start = self.instructions.len();
        self.instructions.extend(other.instructions);
        self.entries.extend(other.entries.into_iter().map(|mut e| {
            e.shift(start);
            e
        }));
        self.views.extend(other.views);
        if self.type_id.is_none() {
            self.type_id = other.type_id;
        }
    }

    /// JSON view of the value, interpreted through its type.
    pub fn to_json(&self, registry: &TypeRegistry) -> JsonValue {
        let renderer = Renderer {
            registry,
            all: &self.instructions,
        };
        let ty = self.type_id.and_then(|id| registry.get(id));
        renderer.ty(ty, 0..self.instructions.len(), &self.entries, &self.views)
    }
}

impl AddAssign<Value> for Value {
    fn add_assign(&mut self, rhs: Value) {
        self.merge(rhs);
    }
}

impl AddAssign<&[Instruction]> for Value {
    fn add_assign(&mut self, rhs: &[Instruction]) {
        self.instructions.extend_from_slice(rhs);
    }
}

struct Renderer<'a> {
    registry: &'a TypeRegistry,
    all: &'a [Instruction],
}

impl Renderer<'_> {
    fn ty(
        &self,
        ty: Option<&Type>,
        range: Range<usize>,
        entries: &[ValueEntry],
        views: &[ValueView],
    ) -> JsonValue {
        let span = self.all.get(range.clone()).unwrap_or(&[]);
        let Some(ty) = ty else {
            return match span {
                [single] => single.operand_json(),
                many => operands(many),
            };
        };
        match ty {
            Type::Alias(t) => match &t.target {
                TypeRef::Resolved(id) => {
                    self.ty(self.registry.unalias(*id), range, entries, views)
                }
                _ => self.ty(None, range, entries, views),
            },
            Type::Complex(_) => {
                let mut out = Map::new();
                for entry in entries {
                    let field_ty = views
                        .iter()
                        .find(|v| v.name == entry.name)
                        .and_then(|v| v.type_ref.type_id())
                        .and_then(|id| self.registry.get(id));
                    out.insert(
                        entry.name.clone(),
                        self.ty(field_ty, entry.range.clone(), &entry.entries, &entry.views),
                    );
                }
                JsonValue::Object(out)
            }
            Type::Enum(_) => span
                .first()
                .and_then(Instruction::as_str)
                .map_or(JsonValue::Null, |s| JsonValue::String(s.to_owned())),
            Type::Bitfield(_) => span
                .first()
                .and_then(Instruction::as_string_array)
                .map_or(JsonValue::Null, |items| serde_json::json!(items)),
            Type::RawData(_) => span.first().map_or(JsonValue::Null, Instruction::operand_json),
            Type::Array(_) | Type::Container(_) => operands(span.get(1..).unwrap_or(&[])),
        }
    }
}

fn operands(span: &[Instruction]) -> JsonValue {
    JsonValue::Array(span.iter().map(Instruction::operand_json).collect())
}
