//! Scene binding matrix, including a full write/read/bind pass.

use std::collections::HashMap;

use prp_bytecode::{Instruction, Opcode, Operand, PrpReader, PrpWriter, Region};
use prp_types::scene::bind;
use prp_types::{SceneError, SceneObject, TypeRegistry};
use serde_json::json;

fn registry() -> TypeRegistry {
    let hashes: HashMap<String, String> = [
        ("ZSpatialEntity", "00C0FFEE"),
        ("ZHitman", "00B0B0B0"),
        ("ZStrict", "00DEAD00"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    let mut registry = TypeRegistry::new();
    registry
        .register_json(
            &[
                json!({"name": "ZSpatialEntity", "kind": "Complex",
                       "allowUnexposedInstructions": true,
                       "fields": [
                           {"name": "m_Name", "type": "PRPOpCode.String"},
                           {"name": "m_mTransform", "type": "SMatrix43"}
                       ]}),
                json!({"name": "ZHitman", "kind": "Complex", "parent": "ZSpatialEntity",
                       "allowUnexposedInstructions": true,
                       "fields": [{"name": "m_eState", "type": "EState"}]}),
                json!({"name": "ZStrict", "kind": "Complex",
                       "fields": [{"name": "m_bOn", "type": "PRPOpCode.Bool"}]}),
                json!({"name": "SMatrix43", "kind": "Array", "entryType": "Float32", "count": 12}),
                json!({"name": "EState", "kind": "Enum",
                       "enum": [{"key": "IDLE", "value": 0}, {"key": "ALERT", "value": 1}]}),
            ],
            &hashes,
        )
        .unwrap();
    registry
}

fn named(opcode: Opcode, name: &str, operand: Operand) -> Instruction {
    Instruction::named(opcode, name, operand)
}

fn spatial(name: &str) -> Vec<Instruction> {
    let mut body = vec![
        Instruction::begin_object(),
        named(Opcode::String, "m_Name", Operand::StringRef(name.into())),
        named(Opcode::Array, "m_mTransform", Operand::Int(12)),
    ];
    body.extend((0..12).map(|i| Instruction::float32(i as f32)));
    body
}

/// Root entity with a nested child object and a controller list, then a
/// hitman entity.
fn level() -> Vec<Instruction> {
    let mut stream = spatial("Scene");
    stream.extend([
        Instruction::container(1),
        Instruction::string("ZController"),
        Instruction::begin_object(),
        Instruction::string("child"),
        Instruction::end_object(),
        Instruction::end_object(),
    ]);
    stream.extend(spatial("Hitman"));
    stream.extend([
        named(Opcode::String, "m_eState", Operand::StringRef("ALERT".into())),
        Instruction::end_object(),
        Instruction::end_of_stream(),
    ]);
    stream
}

fn objects() -> Vec<SceneObject> {
    vec![
        SceneObject::new("Scene", "00C0FFEE"),
        SceneObject::new("Hitman", "00B0B0B0"),
    ]
}

#[test]
fn binds_every_object_in_order() {
    let registry = registry();
    let stream = level();
    let mut objects = objects();
    let cursor = bind(&registry, &mut objects, &stream).unwrap();
    assert_eq!(cursor, stream.len() - 1);
    assert_eq!(stream[cursor].opcode, Opcode::EndOfStream);

    let root = objects[0].value.as_ref().unwrap();
    assert_eq!(root.field("m_Name").and_then(|s| s[0].as_str()), Some("Scene"));
    // Children and controllers are skipped, not retained.
    assert_eq!(root.len(), 14);

    let hitman = objects[1].value.as_ref().unwrap();
    let json = hitman.to_json(&registry);
    assert_eq!(json["m_Name"], json!("Hitman"));
    assert_eq!(json["m_eState"], json!("ALERT"));
    assert_eq!(json["m_mTransform"].as_array().map(Vec::len), Some(12));
}

#[test]
fn mismatch_at_second_object_reports_expected_begin_object() {
    let registry = registry();
    let mut stream = level();
    // Drop the hitman opener; the root entity spans the first 21 instructions.
    let second = 21;
    assert_eq!(stream[second].opcode, Opcode::BeginObject);
    assert_eq!(stream[second + 1].as_str(), Some("Hitman"));
    stream.remove(second);

    let mut objects = objects();
    let err = bind(&registry, &mut objects, &stream).unwrap_err();
    assert_eq!(err.object_index(), 1);
    assert!(matches!(
        err,
        SceneError::BadInstruction {
            region: Region::Instructions,
            ..
        }
    ));
    assert!(err.to_string().contains("expected BeginObject"));
    // A failed scene is refused whole.
    assert!(objects.iter().all(|o| !o.is_bound()));
}

#[test]
fn unknown_hash_fails_without_consuming() {
    let registry = registry();
    let stream = level();
    let mut objects = vec![SceneObject::new("Ghost", "00000000")];
    assert_eq!(
        bind(&registry, &mut objects, &stream),
        Err(SceneError::TypeNotFound {
            object_index: 0,
            hash: "00000000".into(),
        })
    );
    assert!(objects[0].value.is_none());
}

#[test]
fn body_that_does_not_fit_is_a_map_failure() {
    let registry = registry();
    let stream = [
        Instruction::begin_object(),
        named(Opcode::Int32, "m_bOn", Operand::Int(1)),
        Instruction::end_object(),
    ];
    let mut objects = vec![SceneObject::new("switch", "00DEAD00")];
    assert_eq!(
        bind(&registry, &mut objects, &stream),
        Err(SceneError::MapFailed {
            object_index: 0,
            instruction_index: 0,
            type_name: "ZStrict".into(),
        })
    );
}

#[test]
fn named_opener_is_accepted() {
    let registry = registry();
    let stream = [
        named(Opcode::BeginObject, "m_Switch", Operand::None),
        Instruction::bool(true),
        Instruction::end_object(),
    ];
    let mut objects = vec![SceneObject::new("switch", "00DEAD00")];
    assert_eq!(bind(&registry, &mut objects, &stream), Ok(3));
}

#[test]
fn level_survives_file_round_trip() {
    let bytes = PrpWriter::new()
        .object_count(2)
        .instructions(level())
        .write()
        .unwrap();
    let reader = PrpReader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.object_count(), 2);

    let registry = registry();
    let mut objects = objects();
    let cursor = bind(&registry, &mut objects, reader.instructions()).unwrap();
    assert_eq!(cursor, reader.instructions().len() - 1);
    assert!(objects.iter().all(SceneObject::is_bound));
}
