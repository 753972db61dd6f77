//! Shape matching shared by `verify` and `map`.
//!
//! A single pass walks the slice; with `collect` set it also builds the
//! [`Value`], otherwise it only counts consumed instructions.

use prp_bytecode::{Instruction, Opcode};
use tracing::trace;

use super::classes::{ArrayType, BitfieldType, ComplexType, EnumType};
use super::type_ref::{TypeId, TypeRef, ValueView};
use super::{Type, MAX_DEPTH, MAX_NESTING};
use crate::registry::TypeRegistry;
use crate::value::Value;

pub(crate) struct Matched {
    pub(crate) consumed: usize,
    pub(crate) value: Option<Value>,
}

/// Recursion state: alias hops since the last consumed opener, and objects
/// entered so far.
#[derive(Debug, Clone, Copy, Default)]
struct Depth {
    aliases: usize,
    objects: usize,
}

impl Depth {
    fn alias(self) -> Option<Self> {
        (self.aliases < MAX_DEPTH).then_some(Self {
            aliases: self.aliases + 1,
            ..self
        })
    }

    fn object(self) -> Option<Self> {
        (self.objects < MAX_NESTING).then_some(Self {
            aliases: 0,
            objects: self.objects + 1,
        })
    }
}

pub(crate) struct Matcher<'r> {
    registry: &'r TypeRegistry,
    collect: bool,
}

impl<'r> Matcher<'r> {
    pub(crate) fn new(registry: &'r TypeRegistry, collect: bool) -> Self {
        Self { registry, collect }
    }

    /// Matches `ty` at the start of `slice`, opener included.
    pub(crate) fn whole(&self, ty: &Type, slice: &[Instruction]) -> Option<Matched> {
        self.ty(ty, slice, None, Depth::default())
    }

    /// Matches `ty` against an object body whose opener is already consumed.
    pub(crate) fn body(&self, ty: &Type, slice: &[Instruction]) -> Option<Matched> {
        self.body_at(ty, slice, Depth::default())
    }

    fn body_at(&self, ty: &Type, slice: &[Instruction], depth: Depth) -> Option<Matched> {
        match ty {
            Type::Complex(t) => self.complex_body(t, self.id_of(ty), slice, depth),
            Type::Alias(t) => {
                let depth = hop(ty, depth)?;
                match &t.target {
                    TypeRef::Resolved(id) => self.body_at(self.registry.get(*id)?, slice, depth),
                    other => self.type_ref(other, slice, None, depth),
                }
            }
            _ => self.ty(ty, slice, None, depth),
        }
    }

    fn ty(
        &self,
        ty: &Type,
        slice: &[Instruction],
        field: Option<&str>,
        depth: Depth,
    ) -> Option<Matched> {
        let lead = slice.first()?;
        if !name_matches(lead, field) {
            trace!(type_name = ty.name(), ?field, name = ?lead.name, "field name mismatch");
            return None;
        }
        let id = self.id_of(ty);
        let matched = match ty {
            Type::Alias(t) => self.type_ref(&t.target, slice, field, hop(ty, depth)?),
            Type::Enum(t) => self.enumeration(t, id, slice),
            Type::Bitfield(t) => self.bitfield(t, id, slice),
            Type::RawData(_) => lead
                .opcode
                .same_kind(Opcode::RawData)
                .then(|| self.flat(id, &slice[..1])),
            Type::Array(t) => self.array(t, id, slice),
            Type::Container(_) => self.container(id, slice),
            Type::Complex(t) => {
                if !lead.opcode.is_begin_object() {
                    None
                } else {
                    let Some(depth) = depth.object() else {
                        trace!(type_name = ty.name(), "objects nested too deep");
                        return None;
                    };
                    self.complex_body(t, id, &slice[1..], depth).map(|m| Matched {
                        consumed: m.consumed + 1,
                        value: m.value,
                    })
                }
            }
        };
        if matched.is_none() {
            trace!(type_name = ty.name(), opcode = %lead.opcode, "instruction rejected");
        }
        matched
    }

    fn type_ref(
        &self,
        type_ref: &TypeRef,
        slice: &[Instruction],
        field: Option<&str>,
        depth: Depth,
    ) -> Option<Matched> {
        match type_ref {
            TypeRef::Opcode(opcode) => {
                let lead = slice.first()?;
                (name_matches(lead, field) && lead.opcode.same_kind(*opcode))
                    .then(|| self.flat(None, &slice[..1]))
            }
            TypeRef::Resolved(id) => self.ty(self.registry.get(*id)?, slice, field, depth),
            TypeRef::Pending(name) => {
                trace!(reference = %name, "unresolved type reference");
                None
            }
            TypeRef::Unset => None,
        }
    }

    fn enumeration(
        &self,
        t: &EnumType,
        id: Option<TypeId>,
        slice: &[Instruction],
    ) -> Option<Matched> {
        let lead = slice.first()?;
        let ok = lead.opcode.same_kind(Opcode::String)
            && lead.as_str().is_some_and(|text| t.contains(text));
        ok.then(|| self.flat(id, &slice[..1]))
    }

    fn bitfield(
        &self,
        t: &BitfieldType,
        id: Option<TypeId>,
        slice: &[Instruction],
    ) -> Option<Matched> {
        let lead = slice.first()?;
        let ok = lead.opcode.same_kind(Opcode::StringArray)
            && lead
                .as_string_array()
                .is_some_and(|items| items.iter().all(|item| t.contains(item)));
        ok.then(|| self.flat(id, &slice[..1]))
    }

    fn array(&self, t: &ArrayType, id: Option<TypeId>, slice: &[Instruction]) -> Option<Matched> {
        let lead = slice.first()?;
        if !lead.opcode.same_kind(Opcode::Array) || lead.capacity() != Some(t.capacity) {
            return None;
        }
        let span = slice.get(..t.span())?;
        span[1..]
            .iter()
            .all(|e| e.opcode.same_kind(t.element))
            .then(|| self.flat(id, span))
    }

    fn container(&self, id: Option<TypeId>, slice: &[Instruction]) -> Option<Matched> {
        let lead = slice.first()?;
        if !lead.opcode.same_kind(Opcode::Container) {
            return None;
        }
        let count = lead.capacity()?;
        let span = slice.get(..count.checked_add(1)?)?;
        Some(self.flat(id, span))
    }

    /// Fields of the parent chain then own fields, then `EndObject`.
    fn complex_body(
        &self,
        t: &ComplexType,
        id: Option<TypeId>,
        body: &[Instruction],
        depth: Depth,
    ) -> Option<Matched> {
        let views = self.views_of(t)?;
        let mut value = self
            .collect
            .then(|| Value::with_views(id, views.iter().map(|v| (*v).clone()).collect()));
        let mut pos = 0;
        for view in &views {
            let m = self.type_ref(&view.type_ref, body.get(pos..)?, Some(&view.name), depth)?;
            pos += m.consumed;
            if let (Some(value), Some(field)) = (value.as_mut(), m.value) {
                value.push_field(&view.name, field);
            }
        }
        pos += skip_to_end_object(body.get(pos..)?, t.allow_unexposed_instructions)?;
        Some(Matched {
            consumed: pos,
            value,
        })
    }

    /// Parent chain fields first. Fails on an unresolved or non-complex
    /// parent.
    fn views_of<'a>(&self, t: &'a ComplexType) -> Option<Vec<&'a ValueView>>
    where
        'r: 'a,
    {
        let mut chain = vec![t];
        let mut current = t;
        while let Some(parent) = &current.parent {
            if chain.len() > MAX_DEPTH {
                trace!(type_name = %t.name, "parent chain too deep");
                return None;
            }
            let Some(Type::Complex(next)) = parent.type_id().and_then(|id| self.registry.unalias(id))
            else {
                trace!(type_name = %current.name, parent = %parent, "parent is not a resolved complex type");
                return None;
            };
            chain.push(next);
            current = next;
        }
        Some(
            chain
                .into_iter()
                .rev()
                .flat_map(|c| c.fields.iter())
                .collect(),
        )
    }

    fn id_of(&self, ty: &Type) -> Option<TypeId> {
        self.registry.type_id_by_name(ty.name())
    }

    fn flat(&self, id: Option<TypeId>, span: &[Instruction]) -> Matched {
        Matched {
            consumed: span.len(),
            value: self
                .collect
                .then(|| Value::from_instructions(id, span.to_vec())),
        }
    }
}

fn hop(ty: &Type, depth: Depth) -> Option<Depth> {
    let next = depth.alias();
    if next.is_none() {
        trace!(type_name = ty.name(), "alias chain too deep");
    }
    next
}

/// A named instruction leading a field must carry that field's name.
fn name_matches(lead: &Instruction, field: Option<&str>) -> bool {
    match (field, lead.name.as_deref()) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => true,
    }
}

/// Consumes up to and including the closing `EndObject`. Without
/// `allow_unexposed`, the closer must come first; otherwise leftovers are
/// skipped with nested objects balanced.
fn skip_to_end_object(rest: &[Instruction], allow_unexposed: bool) -> Option<usize> {
    let mut nesting = 0usize;
    for (i, instr) in rest.iter().enumerate() {
        match instr.opcode {
            Opcode::EndObject if nesting == 0 => return Some(i + 1),
            _ if !allow_unexposed => return None,
            Opcode::EndObject => nesting -= 1,
            Opcode::EndOfStream => return None,
            op if op.is_begin_object() => nesting += 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use prp_bytecode::Operand;

    #[test]
    fn skip_requires_closer_first_when_strict() {
        let body = [Instruction::end_object(), Instruction::end_of_stream()];
        assert_eq!(skip_to_end_object(&body, false), Some(1));
        let leftover = [Instruction::int32(1), Instruction::end_object()];
        assert_eq!(skip_to_end_object(&leftover, false), None);
        assert_eq!(skip_to_end_object(&leftover, true), Some(2));
    }

    #[test]
    fn skip_balances_nested_objects() {
        let body = [
            Instruction::begin_object(),
            Instruction::int32(1),
            Instruction::end_object(),
            Instruction::end_object(),
            Instruction::end_object(),
        ];
        assert_eq!(skip_to_end_object(&body, true), Some(4));
        let unbalanced = [Instruction::begin_object(), Instruction::end_of_stream()];
        assert_eq!(skip_to_end_object(&unbalanced, true), None);
    }

    #[test]
    fn leading_name_check() {
        let named = Instruction::named(Opcode::Int32, "m_a", Operand::Int(1));
        assert!(name_matches(&named, Some("m_a")));
        assert!(!name_matches(&named, Some("m_b")));
        assert!(name_matches(&named, None));
        assert!(name_matches(&Instruction::int32(1), Some("m_b")));
    }
}
