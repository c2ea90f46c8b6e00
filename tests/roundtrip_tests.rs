//! Whole-record round-trip tests: decode(encode(v)) == v across every field
//! kind, plus randomized properties.

use proptest::prelude::*;
use sproto_wire::codec;
use sproto_wire::schema::{Field, FieldKind, Schema, TypeDef};
use sproto_wire::Value;

fn everything_schema() -> Schema {
    Schema::assemble(
        vec![
            TypeDef::new(
                "Inner",
                vec![
                    Field::new("id", 0, FieldKind::Integer),
                    Field::new("label", 1, FieldKind::String),
                ],
            ),
            TypeDef::new(
                "Everything",
                vec![
                    Field::new("int", 0, FieldKind::Integer),
                    Field::new("flag", 1, FieldKind::Boolean),
                    Field::new("text", 2, FieldKind::String),
                    Field::new("blob", 3, FieldKind::Binary),
                    Field::new("ratio", 4, FieldKind::Double),
                    Field::new("nested", 5, FieldKind::Struct(0)),
                    Field::new("ints", 6, FieldKind::Integer).array(),
                    Field::new("flags", 7, FieldKind::Boolean).array(),
                    Field::new("texts", 8, FieldKind::String).array(),
                    Field::new("ratios", 9, FieldKind::Double).array(),
                    Field::new("nests", 10, FieldKind::Struct(0)).array(),
                    Field::new("money", 11, FieldKind::Integer).fixed(2),
                ],
            ),
        ],
        vec![],
    )
}

#[test]
fn every_field_kind_round_trips() {
    let schema = everything_schema();
    let ty = schema.type_by_name("Everything").unwrap();

    let value = Value::record([
        ("int", (-123456789i64).into()),
        ("flag", true.into()),
        ("text", "héllo wörld".into()),
        ("blob", vec![0u8, 255, 128].into()),
        ("ratio", 0.1f64.into()),
        (
            "nested",
            Value::record([("id", 9i64.into()), ("label", "in".into())]),
        ),
        ("ints", vec![0i64, -1, i64::MAX, i64::MIN].into()),
        ("flags", vec![false, true].into()),
        ("texts", vec!["a".to_string(), String::new()].into()),
        ("ratios", vec![1.5f64, -0.25, f64::INFINITY].into()),
        (
            "nests",
            Value::Array(vec![
                Value::record([("id", 1i64.into())]),
                Value::record([("label", "two".into())]),
            ]),
        ),
        ("money", 19.99f64.into()),
    ]);

    let bytes = codec::encode(&schema, ty, &value).unwrap();
    assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
}

#[test]
fn missing_fields_stay_missing() {
    let schema = everything_schema();
    let ty = schema.type_by_name("Everything").unwrap();

    let value = Value::record([("flag", false.into()), ("texts", vec!["x".to_string()].into())]);
    let bytes = codec::encode(&schema, ty, &value).unwrap();
    let decoded = codec::decode(&schema, ty, &bytes).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded.get("int"), None);
    assert_eq!(decoded.get("nested"), None);
}

#[test]
fn empty_arrays_survive_distinct_from_absent() {
    let schema = everything_schema();
    let ty = schema.type_by_name("Everything").unwrap();

    let value = Value::record([("ints", Value::Array(vec![]))]);
    let decoded = codec::decode(
        &schema,
        ty,
        &codec::encode(&schema, ty, &value).unwrap(),
    )
    .unwrap();
    assert_eq!(decoded.get("ints"), Some(&Value::Array(vec![])));
    assert_eq!(decoded.get("flags"), None);
}

#[test]
fn nan_double_round_trips_bitwise() {
    let schema = everything_schema();
    let ty = schema.type_by_name("Everything").unwrap();

    let value = Value::record([("ratio", f64::NAN.into())]);
    let bytes = codec::encode(&schema, ty, &value).unwrap();
    assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
}

#[test]
fn max_depth_nesting_is_accepted() {
    let schema = Schema::assemble(
        vec![TypeDef::new(
            "Node",
            vec![
                Field::new("next", 0, FieldKind::Struct(0)),
                Field::new("leaf", 1, FieldKind::Integer),
            ],
        )],
        vec![],
    );
    let ty = schema.type_by_name("Node").unwrap();

    let mut value = Value::record([("leaf", 1i64.into())]);
    for _ in 0..63 {
        value = Value::record([("next", value)]);
    }
    let bytes = codec::encode(&schema, ty, &value).unwrap();
    assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
}

fn int_schema() -> Schema {
    Schema::assemble(
        vec![TypeDef::new(
            "P",
            vec![
                Field::new("x", 0, FieldKind::Integer),
                Field::new("xs", 1, FieldKind::Integer).array(),
                Field::new("s", 2, FieldKind::String),
                Field::new("d", 3, FieldKind::Double),
            ],
        )],
        vec![],
    )
}

proptest! {
    #[test]
    fn any_integer_round_trips(x in any::<i64>()) {
        let schema = int_schema();
        let ty = schema.type_by_name("P").unwrap();
        let value = Value::record([("x", x.into())]);
        let bytes = codec::encode(&schema, ty, &value).unwrap();
        prop_assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
    }

    #[test]
    fn any_integer_array_round_trips(xs in proptest::collection::vec(any::<i64>(), 0..48)) {
        let schema = int_schema();
        let ty = schema.type_by_name("P").unwrap();
        let value = Value::record([("xs", xs.into())]);
        let bytes = codec::encode(&schema, ty, &value).unwrap();
        prop_assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
    }

    #[test]
    fn any_string_round_trips(s in ".{0,64}") {
        let schema = int_schema();
        let ty = schema.type_by_name("P").unwrap();
        let value = Value::record([("s", s.into())]);
        let bytes = codec::encode(&schema, ty, &value).unwrap();
        prop_assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
    }

    #[test]
    fn any_double_round_trips(d in any::<f64>()) {
        let schema = int_schema();
        let ty = schema.type_by_name("P").unwrap();
        let value = Value::record([("d", d.into())]);
        let bytes = codec::encode(&schema, ty, &value).unwrap();
        prop_assert_eq!(codec::decode(&schema, ty, &bytes).unwrap(), value);
    }
}
