//! Type verify/map matrix over a small level schema.

use std::collections::HashMap;

use prp_bytecode::{Instruction, Opcode, Operand};
use prp_types::{Type, TypeRegistry, MAX_NESTING};
use serde_json::json;

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register_json(
            &[
                json!({"name": "ZBase", "kind": "Complex",
                       "fields": [{"name": "m_Id", "type": "PRPOpCode.Int32"}]}),
                json!({"name": "ZGEOM", "kind": "TypeKind.COMPLEX", "parent": "ZBase",
                       "fields": [
                           {"name": "m_Name", "type": "ZString"},
                           {"name": "m_State", "type": "EState"},
                           {"name": "m_Transform", "type": "ZTransform"},
                           {"name": "m_Flags", "type": "EFlags"}
                       ]}),
                json!({"name": "ZTransform", "kind": "Complex",
                       "fields": [{"name": "m_Pos", "type": "SVec3"}]}),
                json!({"name": "ZString", "kind": "Alias", "alias": "PRPOpCode.String"}),
                json!({"name": "EState", "kind": "Enum",
                       "enum": [{"key": "IDLE", "value": 0}, {"key": "RUN", "value": 1}]}),
                json!({"name": "EFlags", "kind": "Bitfield",
                       "enum": [{"key": "VISIBLE", "value": 1}, {"key": "SOLID", "value": 2}]}),
                json!({"name": "SVec3", "kind": "Array", "entryType": "Float32", "count": 3}),
                json!({"name": "ZBinary", "kind": "RawData"}),
                json!({"name": "ZList", "kind": "Container"}),
                json!({"name": "ZLoose", "kind": "Complex", "parent": "ZBase",
                       "allowUnexposedInstructions": true,
                       "fields": [{"name": "m_Name", "type": "ZString"}]}),
            ],
            &HashMap::new(),
        )
        .unwrap();
    registry
}

fn ty<'r>(registry: &'r TypeRegistry, name: &str) -> &'r Type {
    registry.find_type_by_name(name).unwrap()
}

fn named(opcode: Opcode, name: &str, operand: Operand) -> Instruction {
    Instruction::named(opcode, name, operand)
}

fn geom_level() -> Vec<Instruction> {
    vec![
        Instruction::begin_object(),
        named(Opcode::Int32, "m_Id", Operand::Int(7)),
        named(Opcode::String, "m_Name", Operand::StringRef("Hitman".into())),
        named(Opcode::String, "m_State", Operand::StringRef("RUN".into())),
        named(Opcode::BeginObject, "m_Transform", Operand::None),
        named(Opcode::Array, "m_Pos", Operand::Int(3)),
        Instruction::float32(1.0),
        Instruction::float32(2.0),
        Instruction::float32(3.0),
        Instruction::end_object(),
        named(
            Opcode::StringArray,
            "m_Flags",
            Operand::StringArray(vec!["VISIBLE".into(), "SOLID".into()]),
        ),
        Instruction::end_object(),
        Instruction::end_of_stream(),
    ]
}

#[test]
fn enum_requires_exact_declared_name() {
    let registry = registry();
    let state = ty(&registry, "EState");
    let ok = [Instruction::string("RUN"), Instruction::end_of_stream()];
    let verified = state.verify(&registry, &ok);
    assert!(verified.ok);
    assert_eq!(verified.rest, &ok[1..]);

    for bad in [
        Instruction::string("run"),
        Instruction::string("WALK"),
        Instruction::int32(1),
    ] {
        let verified = state.verify(&registry, std::slice::from_ref(&bad));
        assert!(!verified.ok, "{bad} accepted");
        assert!(verified.rest.is_empty());
    }
}

#[test]
fn array_consumes_header_plus_capacity() {
    let registry = registry();
    let vec3 = ty(&registry, "SVec3");
    let stream = [
        Instruction::array(3),
        Instruction::float32(1.0),
        named(Opcode::Float32, "y", Operand::Float(2.0)),
        Instruction::float32(3.0),
        Instruction::end_of_stream(),
    ];
    let verified = vec3.verify(&registry, &stream);
    assert!(verified.ok);
    assert_eq!(verified.rest.len(), 1);

    let mapped = vec3.map(&registry, &stream);
    assert_eq!(mapped.value.as_ref().map(|v| v.len()), Some(4));
    assert_eq!(mapped.rest.len(), 1);
    assert_eq!(
        mapped.value.unwrap().to_json(&registry),
        json!([1.0, 2.0, 3.0])
    );
}

#[test]
fn array_with_fewer_elements_fails_without_consumption() {
    let registry = registry();
    let vec3 = ty(&registry, "SVec3");
    let short = [
        Instruction::array(3),
        Instruction::float32(1.0),
        Instruction::float32(2.0),
        Instruction::end_of_stream(),
    ];
    assert!(!vec3.verify(&registry, &short).ok);
    let mapped = vec3.map(&registry, &short);
    assert!(mapped.value.is_none());
    assert_eq!(mapped.rest.len(), short.len());

    let wrong_header = [
        Instruction::array(2),
        Instruction::float32(1.0),
        Instruction::float32(2.0),
    ];
    assert!(!vec3.verify(&registry, &wrong_header).ok);

    let wrong_element = [
        Instruction::array(3),
        Instruction::float32(1.0),
        Instruction::int32(2),
        Instruction::float32(3.0),
    ];
    assert!(!vec3.verify(&registry, &wrong_element).ok);
}

#[test]
fn bitfield_accepts_only_declared_name_lists() {
    let registry = registry();
    let flags = ty(&registry, "EFlags");
    assert!(flags.verify(&registry, &[Instruction::string_array(["SOLID"])]).ok);
    assert!(flags.verify(&registry, &[Instruction::string_array(Vec::<String>::new())]).ok);
    assert!(!flags.verify(&registry, &[Instruction::string_array(["SOLID", "HIDDEN"])]).ok);

    let names = Instruction::string_array(["VISIBLE", "SOLID"]);
    let mapped = flags.map(&registry, std::slice::from_ref(&names));
    assert_eq!(
        mapped.value.unwrap().to_json(&registry),
        json!(["VISIBLE", "SOLID"])
    );

    // A raw mask is not a name list, even when every bit is declared.
    for mask in [0, 1, 3] {
        let stream = [
            Instruction::new(Opcode::Bitfield, Operand::Int(mask)),
            Instruction::end_of_stream(),
        ];
        let verified = flags.verify(&registry, &stream);
        assert!(!verified.ok, "mask {mask} accepted");
        assert!(verified.rest.is_empty());
    }
}

#[test]
fn raw_data_and_container_pass_through() {
    let registry = registry();
    let raw = ty(&registry, "ZBinary");
    let stream = [Instruction::raw_data(vec![1, 2, 3])];
    let mapped = raw.map(&registry, &stream);
    assert_eq!(mapped.value.unwrap().to_json(&registry), json!([1, 2, 3]));
    assert!(!raw.verify(&registry, &[Instruction::int32(1)]).ok);

    let list = ty(&registry, "ZList");
    let stream = [
        Instruction::container(2),
        Instruction::int32(5),
        Instruction::string("x"),
        Instruction::end_of_stream(),
    ];
    let mapped = list.map(&registry, &stream);
    assert_eq!(mapped.rest.len(), 1);
    assert_eq!(mapped.value.unwrap().to_json(&registry), json!([5, "x"]));
    assert!(!list.verify(&registry, &stream[..2]).ok);
}

#[test]
fn complex_fields_follow_parent_chain_order() {
    let registry = registry();
    let geom = ty(&registry, "ZGEOM");
    let stream = geom_level();
    let verified = geom.verify(&registry, &stream);
    assert!(verified.ok);
    assert_eq!(verified.rest, &stream[12..]);

    // Parent field after own fields: rejected.
    let mut reordered = stream.clone();
    let id = reordered.remove(1);
    reordered.insert(10, id);
    assert!(!geom.verify(&registry, &reordered).ok);
}

#[test]
fn complex_inheritance_abc_order() {
    let mut registry = TypeRegistry::new();
    registry
        .register_json(
            &[
                json!({"name": "B", "kind": "Complex", "parent": "A",
                       "fields": [{"name": "c", "type": "PRPOpCode.Int32"}]}),
                json!({"name": "A", "kind": "Complex", "fields": [
                    {"name": "a", "type": "PRPOpCode.Int32"},
                    {"name": "b", "type": "PRPOpCode.Int32"}
                ]}),
            ],
            &HashMap::new(),
        )
        .unwrap();
    let b = ty(&registry, "B");
    let field = |n: &str| named(Opcode::Int32, n, Operand::Int(0));
    let abc = [
        Instruction::begin_object(),
        field("a"),
        field("b"),
        field("c"),
        Instruction::end_object(),
    ];
    let cab = [
        Instruction::begin_object(),
        field("c"),
        field("a"),
        field("b"),
        Instruction::end_object(),
    ];
    assert!(b.verify(&registry, &abc).ok);
    assert!(!b.verify(&registry, &cab).ok);
}

#[test]
fn field_name_must_match_named_lead() {
    let registry = registry();
    let base = ty(&registry, "ZBase");
    let stream = [
        Instruction::begin_object(),
        named(Opcode::Int32, "m_Other", Operand::Int(7)),
        Instruction::end_object(),
    ];
    assert!(!base.verify(&registry, &stream).ok);

    let anonymous = [
        Instruction::begin_object(),
        Instruction::int32(7),
        Instruction::end_object(),
    ];
    assert!(base.verify(&registry, &anonymous).ok);
}

#[test]
fn unexposed_instructions_are_skipped_only_when_allowed() {
    let registry = registry();
    let body = vec![
        Instruction::begin_object(),
        Instruction::int32(1),
        Instruction::string("Hitman"),
        Instruction::float32(9.0),
        Instruction::begin_object(),
        Instruction::end_object(),
        Instruction::end_object(),
        Instruction::end_of_stream(),
    ];
    let loose = ty(&registry, "ZLoose");
    let mapped = loose.map(&registry, &body);
    assert_eq!(mapped.rest.len(), 1);
    let value = mapped.value.unwrap();
    assert_eq!(value.len(), 2);
    assert_eq!(value.to_json(&registry), json!({"m_Id": 1, "m_Name": "Hitman"}));

    let strict = ty(&registry, "ZBase");
    assert!(!strict.verify(&registry, &body).ok);
}

#[test]
fn map_builds_nested_entries_and_json() {
    let registry = registry();
    let geom = ty(&registry, "ZGEOM");
    let stream = geom_level();
    let mapped = geom.map(&registry, &stream);
    assert_eq!(mapped.rest.len(), 1);
    let value = mapped.value.unwrap();

    assert_eq!(value.type_id(), registry.type_id_by_name("ZGEOM"));
    assert_eq!(value.views().len(), 5);
    assert_eq!(value.len(), 8);
    let transform = value.entry("m_Transform").unwrap();
    assert_eq!(transform.range, 3..7);
    assert_eq!(transform.entry("m_Pos").unwrap().range, 3..7);
    assert_eq!(
        value.field("m_State").and_then(|s| s[0].as_str()),
        Some("RUN")
    );

    assert_eq!(
        value.to_json(&registry),
        json!({
            "m_Id": 7,
            "m_Name": "Hitman",
            "m_State": "RUN",
            "m_Transform": {"m_Pos": [1.0, 2.0, 3.0]},
            "m_Flags": ["VISIBLE", "SOLID"]
        })
    );
}

#[test]
fn body_variants_skip_the_opener() {
    let registry = registry();
    let geom = ty(&registry, "ZGEOM");
    let stream = geom_level();
    let verified = geom.verify_body(&registry, &stream[1..]);
    assert!(verified.ok);
    assert_eq!(verified.rest.len(), 1);
    assert_eq!(
        geom.map_body(&registry, &stream[1..]).value,
        geom.map(&registry, &stream).value
    );

    // Non-complex shapes behave like verify/map.
    let state = ty(&registry, "EState");
    let one = [Instruction::string("IDLE")];
    assert_eq!(state.verify_body(&registry, &one), state.verify(&registry, &one));
}

#[test]
fn alias_delegates_to_target() {
    let registry = registry();
    let alias = ty(&registry, "ZString");
    assert!(alias.verify(&registry, &[Instruction::string("x")]).ok);
    assert!(alias
        .verify(&registry, &[named(Opcode::String, "m_Name", Operand::StringRef("x".into()))])
        .ok);
    assert!(!alias.verify(&registry, &[Instruction::int32(1)]).ok);
}

/// `levels` complex types, each holding the next as `m_Child`, and one
/// instance of the outermost.
fn nested_chain(levels: usize) -> (TypeRegistry, Vec<Instruction>) {
    let decls: Vec<_> = (0..levels)
        .map(|i| {
            if i + 1 < levels {
                json!({"name": format!("ZLevel{i}"), "kind": "Complex",
                       "fields": [{"name": "m_Child", "type": format!("ZLevel{}", i + 1)}]})
            } else {
                json!({"name": format!("ZLevel{i}"), "kind": "Complex"})
            }
        })
        .collect();
    let mut registry = TypeRegistry::new();
    registry.register_json(&decls, &HashMap::new()).unwrap();

    let mut stream = vec![Instruction::begin_object()];
    stream.extend((1..levels).map(|_| named(Opcode::BeginObject, "m_Child", Operand::None)));
    stream.extend((0..levels).map(|_| Instruction::end_object()));
    stream.push(Instruction::end_of_stream());
    (registry, stream)
}

#[test]
fn deep_finite_nesting_verifies() {
    let (registry, stream) = nested_chain(70);
    let outer = ty(&registry, "ZLevel0");
    let verified = outer.verify(&registry, &stream);
    assert!(verified.ok);
    assert_eq!(verified.rest.len(), 1);

    let value = outer.map(&registry, &stream).value.unwrap();
    assert_eq!(value.entry("m_Child").map(|e| e.entries.len()), Some(1));
}

#[test]
fn nesting_beyond_the_cap_is_rejected() {
    let (registry, stream) = nested_chain(MAX_NESTING);
    assert!(ty(&registry, "ZLevel0").verify(&registry, &stream).ok);

    let (registry, stream) = nested_chain(MAX_NESTING + 1);
    assert!(!ty(&registry, "ZLevel0").verify(&registry, &stream).ok);
}
