//! Scene binding: maps each scene object's body in a level's flat
//! instruction stream.
//!
//! Objects are visited in order. Each must start at a `BeginObject` (or
//! `BeginNamedObject`); its type is looked up by hash and mapped against the
//! body following the opener. Nested children live inside the owning body
//! and are skipped when the owning type allows unexposed instructions.

use prp_bytecode::{Instruction, Region};
use tracing::{debug, instrument, trace};

use crate::error::SceneError;
use crate::registry::TypeRegistry;
use crate::value::Value;

/// A scene object awaiting its property value.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub type_hash: String,
    pub value: Option<Value>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, type_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hash: type_hash.into(),
            value: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }
}

/// Binds every object in `objects` to its body in `instructions`.
///
/// Returns the cursor after the last object. The first failure aborts the
/// visit and leaves every object untouched; values are attached only once
/// the whole scene has mapped.
#[instrument(
    name = "prp::scene::bind",
    level = "debug",
    skip_all,
    fields(objects = objects.len(), instructions = instructions.len())
)]
pub fn bind(
    registry: &TypeRegistry,
    objects: &mut [SceneObject],
    instructions: &[Instruction],
) -> Result<usize, SceneError> {
    let mut cursor = 0;
    let mut staged = Vec::with_capacity(objects.len());
    for (object_index, object) in objects.iter().enumerate() {
        if !instructions
            .get(cursor)
            .is_some_and(|instr| instr.opcode.is_begin_object())
        {
            return Err(SceneError::BadInstruction {
                object_index,
                instruction_index: cursor,
                region: Region::Instructions,
            });
        }

        let ty = registry
            .find_type_by_hash(&object.type_hash)
            .ok_or_else(|| SceneError::TypeNotFound {
                object_index,
                hash: object.type_hash.clone(),
            })?;

        let body = &instructions[cursor + 1..];
        let mapped = ty.map_body(registry, body);
        let Some(value) = mapped.value else {
            return Err(SceneError::MapFailed {
                object_index,
                instruction_index: cursor,
                type_name: ty.name().to_owned(),
            });
        };

        cursor = instructions.len() - mapped.rest.len();
        trace!(object_index, object = %object.name, type_name = ty.name(), cursor, "object mapped");
        staged.push(value);
    }
    for (object, value) in objects.iter_mut().zip(staged) {
        object.value = Some(value);
    }
    debug!(cursor, "scene bound");
    Ok(cursor)
}
