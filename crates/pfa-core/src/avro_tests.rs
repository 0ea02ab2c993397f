use super::*;

#[test]
fn validate_accepts_well_formed_types() {
    let ty = AvroType::record(
        "Point",
        [
            ("x", AvroType::Double),
            ("y", AvroType::Double),
            ("tag", AvroType::union([AvroType::Null, AvroType::String])),
        ],
    );

    assert_eq!(ty.validate(), Ok(()));
}

#[test]
fn validate_rejects_nested_union() {
    let ty = AvroType::union([
        AvroType::Null,
        AvroType::union([AvroType::Int, AvroType::String]),
    ]);

    assert_eq!(ty.validate(), Err(SchemaError::NestedUnion));
}

#[test]
fn validate_rejects_duplicate_variant() {
    let ty = AvroType::union([AvroType::Int, AvroType::Int]);

    assert_eq!(
        ty.validate(),
        Err(SchemaError::DuplicateVariant("int".to_owned()))
    );
}

#[test]
fn validate_distinguishes_named_variants_by_name() {
    let ty = AvroType::union([AvroType::fixed("A", 4), AvroType::fixed("B", 4)]);

    assert_eq!(ty.validate(), Ok(()));
}

#[test]
fn validate_rejects_duplicate_field_in_nested_record() {
    let inner = AvroType::record("Inner", [("a", AvroType::Int), ("a", AvroType::Long)]);
    let ty = AvroType::array(inner);

    assert_eq!(
        ty.validate(),
        Err(SchemaError::DuplicateField {
            record: "Inner".to_owned(),
            field: "a".to_owned(),
        })
    );
}

#[test]
fn validate_rejects_duplicate_symbol() {
    let ty = AvroType::enumeration("Color", ["red", "green", "red"]);

    let err = ty.validate().expect_err("duplicate symbol");
    assert_eq!(err.to_string(), "enum `Color` declares symbol `red` more than once");
}

#[test]
fn validate_rejects_empty_union() {
    assert_eq!(AvroType::Union(vec![]).validate(), Err(SchemaError::EmptyUnion));
}

#[test]
fn numeric_rank_orders_widening_chain() {
    let ranks: Vec<_> = [AvroType::Int, AvroType::Long, AvroType::Float, AvroType::Double]
        .iter()
        .map(|t| t.numeric_rank())
        .collect();

    assert_eq!(ranks, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(AvroType::String.numeric_rank(), None);
}

#[test]
fn display_is_compact() {
    let ty = AvroType::map(AvroType::union([
        AvroType::Null,
        AvroType::array(AvroType::fixed("Hash", 16)),
    ]));

    insta::assert_snapshot!(ty.to_string(), @"map<union[null, array<fixed Hash(16)>]>");
}

#[test]
fn serializes_as_avro_schema() {
    let ty = AvroType::record(
        "R",
        [
            ("xs", AvroType::array(AvroType::Int)),
            ("e", AvroType::enumeration("E", ["A", "B"])),
        ],
    );

    let json = serde_json::to_string(&ty).expect("serialize");
    insta::assert_snapshot!(json, @r#"{"type":"record","name":"R","fields":[{"name":"xs","type":{"type":"array","items":"int"}},{"name":"e","type":{"type":"enum","name":"E","symbols":["A","B"]}}]}"#);
}
