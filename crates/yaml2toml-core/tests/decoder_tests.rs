/// Decoder contract tests.
///
/// Each source grammar must decode into the same generic tree, without losing
/// information and without honouring tags outside the fixed vocabulary.
use yaml2toml_core::{decode_str, ConvertError, Format, Timestamp, Value};

fn yaml(text: &str) -> Value {
    decode_str(text, Format::Yaml).unwrap()
}

fn pairs(entries: &[(&str, Value)]) -> Value {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ============================================================================
// YAML scalars
// ============================================================================

#[test]
fn yaml_scalars() {
    let value = yaml("s: text\ni: -42\nf: 2.5\nb: true\nn: ~\n");
    assert_eq!(
        value,
        pairs(&[
            ("s", Value::from("text")),
            ("i", Value::from(-42i64)),
            ("f", Value::from(2.5)),
            ("b", Value::from(true)),
            ("n", Value::Null),
        ])
    );
}

#[test]
fn yaml_unsigned_integer_is_lossless() {
    let value = yaml("big: 18446744073709551615\n");
    assert_eq!(value.get("big"), Some(&Value::Integer(u64::MAX.into())));
}

#[test]
fn yaml_quoted_scalars_stay_strings() {
    let value = yaml("a: \"1\"\nb: 'true'\nc: \"null\"\n");
    assert_eq!(value.get("a"), Some(&Value::from("1")));
    assert_eq!(value.get("b"), Some(&Value::from("true")));
    assert_eq!(value.get("c"), Some(&Value::from("null")));
}

fn timestamp(text: &str) -> Value {
    Value::Timestamp(text.parse::<Timestamp>().unwrap())
}

#[test]
fn yaml_plain_date_is_timestamp() {
    let value = yaml("day: 2024-01-01\nat: 2001-12-14 21:59:43.10 -5\n");
    assert_eq!(value.get("day"), Some(&timestamp("2024-01-01")));
    assert_eq!(value.get("at"), Some(&timestamp("2001-12-14T21:59:43.1-05:00")));
}

#[test]
fn yaml_quoted_date_stays_string() {
    let value = yaml("a: '2024-01-01'\nb: \"2024-01-01\"\nc: !!str 2024-01-01\nd: ! 2024-01-01\n");
    for key in ["a", "b", "c", "d"] {
        assert_eq!(value.get(key), Some(&Value::from("2024-01-01")), "key {key}");
    }
}

#[test]
fn yaml_date_like_text_stays_string() {
    let value = yaml("day: 2024-02-30x\nimpossible: 2024-02-30\n");
    assert_eq!(value.get("day"), Some(&Value::from("2024-02-30x")));
    assert_eq!(value.get("impossible"), Some(&Value::from("2024-02-30")));
}

#[test]
fn yaml_block_scalar() {
    let value = yaml("text: |\n  line one\n  line two\n");
    assert_eq!(value.get("text"), Some(&Value::from("line one\nline two\n")));
}

// ============================================================================
// YAML structure
// ============================================================================

#[test]
fn yaml_mapping_keeps_source_order() {
    let value = yaml("z: 1\ny: 2\nx: 3\n");
    let Value::Mapping(entries) = value else {
        panic!("expected mapping");
    };
    let keys: Vec<_> = entries.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, ["z", "y", "x"]);
}

#[test]
fn yaml_non_string_keys_are_kept() {
    let value = yaml("1: one\ntrue: yes\n");
    let Value::Mapping(entries) = value else {
        panic!("expected mapping");
    };
    assert_eq!(entries[0].0, Value::from(1i64));
    assert_eq!(entries[1].0, Value::from(true));
    assert_eq!(entries[1].1, Value::from("yes"));
}

#[test]
fn yaml_sequence_root() {
    assert_eq!(
        yaml("- 1\n- 2\n"),
        Value::Sequence(vec![Value::from(1i64), Value::from(2i64)])
    );
}

#[test]
fn yaml_empty_document_is_null() {
    assert_eq!(yaml(""), Value::Null);
    assert_eq!(yaml("  \n\n"), Value::Null);
}

#[test]
fn yaml_aliases_are_resolved() {
    let value = yaml("base: &base\n  x: 1\ncopy: *base\n");
    assert_eq!(value.get("copy"), value.get("base"));
}

#[test]
fn yaml_merge_keys_are_applied() {
    let value = yaml("base: &base\n  x: 1\n  y: 1\nchild:\n  <<: *base\n  y: 2\n");
    let child = value.get("child").unwrap();
    assert_eq!(child.get("x"), Some(&Value::from(1i64)));
    assert_eq!(child.get("y"), Some(&Value::from(2i64)));
    assert_eq!(child.get("<<"), None);
}

#[test]
fn yaml_byte_order_mark_is_ignored() {
    assert_eq!(yaml("\u{feff}a: 1\n").get("a"), Some(&Value::from(1i64)));
}

// ============================================================================
// YAML tags (safe decoding)
// ============================================================================

#[test]
fn yaml_custom_tag_is_rejected() {
    let err = decode_str("key: !Ref other\n", Format::Yaml).unwrap_err();
    assert!(matches!(err, ConvertError::Decode { format: Format::Yaml, .. }));
    assert!(err.to_string().contains("unsupported tag"), "got {err}");
}

#[test]
fn yaml_custom_tag_on_mapping_is_rejected() {
    let err = decode_str("obj: !Thing\n  a: 1\n", Format::Yaml).unwrap_err();
    assert!(matches!(err, ConvertError::Decode { .. }));
}

#[test]
fn yaml_timestamp_tag_builds_timestamp() {
    let value = yaml("a: !!timestamp 2001-12-14T21:59:43Z\nb: !!timestamp 2001-12-14\n");
    assert_eq!(value.get("a"), Some(&timestamp("2001-12-14T21:59:43Z")));
    assert_eq!(value.get("b"), Some(&timestamp("2001-12-14")));
}

#[test]
fn yaml_invalid_timestamp_is_rejected() {
    let err = decode_str("at: !!timestamp soon\n", Format::Yaml).unwrap_err();
    assert!(err.to_string().contains("invalid timestamp"), "got {err}");
}

#[test]
fn yaml_local_timestamp_tag_is_rejected() {
    let err = decode_str("at: !timestamp 2001-12-14\n", Format::Yaml).unwrap_err();
    assert!(err.to_string().contains("unsupported tag !timestamp"), "got {err}");
}

#[test]
fn yaml_foreign_global_tag_is_rejected() {
    let err = decode_str("a: !!python/object/apply:os.system ['ls']\n", Format::Yaml)
        .unwrap_err();
    assert!(matches!(err, ConvertError::Decode { format: Format::Yaml, .. }));
    assert!(
        err.to_string()
            .contains("unsupported tag !!python/object/apply:os.system"),
        "got {err}"
    );
}

#[test]
fn yaml_binary_tag_is_rejected() {
    let err = decode_str("a: !!binary aGVsbG8=\n", Format::Yaml).unwrap_err();
    assert!(err.to_string().contains("unsupported tag !!binary"), "got {err}");
}

#[test]
fn yaml_core_tags_are_honoured() {
    let value = yaml("i: !!int \"42\"\nf: !!float 1\ns: !!str 42\nb: !!bool true\nn: !!null ''\n");
    assert_eq!(value.get("i"), Some(&Value::from(42i64)));
    assert_eq!(value.get("f"), Some(&Value::from(1.0)));
    assert_eq!(value.get("s"), Some(&Value::from("42")));
    assert_eq!(value.get("b"), Some(&Value::from(true)));
    assert_eq!(value.get("n"), Some(&Value::Null));
}

#[test]
fn yaml_core_collection_tags_are_honoured() {
    let value = yaml("m: !!map {k: v}\ns: !!seq [1]\n");
    assert_eq!(value.get("m"), Some(&pairs(&[("k", Value::from("v"))])));
    assert_eq!(value.get("s"), Some(&Value::Sequence(vec![Value::from(1i64)])));
}

#[test]
fn yaml_tag_shape_mismatch_is_rejected() {
    for (text, expected) in [
        ("a: !!map [1]\n", "sequence value does not match tag !!map"),
        ("a: !!seq {k: v}\n", "mapping value does not match tag !!seq"),
        ("a: !!map text\n", "scalar value does not match tag !!map"),
        ("a: !!int text\n", "invalid !!int value"),
        ("a: !!str [1]\n", "sequence value does not match tag !!str"),
    ] {
        let err = decode_str(text, Format::Yaml).unwrap_err();
        assert!(err.to_string().contains(expected), "{text:?}: got {err}");
    }
}

#[test]
fn yaml_tag_error_has_location() {
    let err = decode_str("a: 1\nb: !Ref x\n", Format::Yaml).unwrap_err();
    match err {
        ConvertError::Decode { location, .. } => {
            assert_eq!(location.map(|l| l.line), Some(2));
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
}

// ============================================================================
// YAML failures
// ============================================================================

#[test]
fn yaml_unterminated_flow_sequence() {
    let err = decode_str("key: [unterminated", Format::Yaml).unwrap_err();
    assert!(matches!(err, ConvertError::Decode { format: Format::Yaml, .. }));
}

#[test]
fn yaml_multiple_documents_are_rejected() {
    let err = decode_str("a: 1\n---\nb: 2\n", Format::Yaml).unwrap_err();
    assert!(matches!(err, ConvertError::Decode { .. }));
}

#[test]
fn yaml_unknown_alias_is_rejected() {
    let err = decode_str("a: *missing\n", Format::Yaml).unwrap_err();
    assert!(err.to_string().contains("unknown anchor"), "got {err}");
}

#[test]
fn yaml_alias_bomb_is_rejected() {
    let mut text = String::from("l0: &l0 [x, x, x, x, x, x, x, x, x, x]\n");
    for level in 1..8 {
        let prev = level - 1;
        text.push_str(&format!(
            "l{level}: &l{level} [*l{prev}, *l{prev}, *l{prev}, *l{prev}, *l{prev}, \
             *l{prev}, *l{prev}, *l{prev}, *l{prev}, *l{prev}]\n"
        ));
    }
    let err = decode_str(&text, Format::Yaml).unwrap_err();
    assert!(err.to_string().contains("size limit"), "got {err}");
}

#[test]
fn yaml_merge_sequence_prefers_earlier_sources() {
    let value = yaml(
        "a: &a {x: 1, y: 1}\nb: &b {y: 2, z: 2}\nc:\n  <<: [*a, *b]\n  z: 3\n",
    );
    let c = value.get("c").unwrap();
    assert_eq!(
        *c,
        pairs(&[
            ("x", Value::from(1i64)),
            ("y", Value::from(1i64)),
            ("z", Value::from(3i64)),
        ])
    );
}

#[test]
fn yaml_merge_of_scalar_is_rejected() {
    let err = decode_str("a:\n  <<: 1\n", Format::Yaml).unwrap_err();
    assert!(err.to_string().contains("cannot merge"), "got {err}");
}

#[test]
fn yaml_duplicate_keys_are_rejected() {
    let err = decode_str("a: 1\na: 2\n", Format::Yaml).unwrap_err();
    assert!(matches!(err, ConvertError::Decode { .. }));
}

// ============================================================================
// TOML and JSON sources
// ============================================================================

#[test]
fn toml_document() {
    let value = decode_str(
        "title = \"t\"\n[owner]\nname = \"ada\"\ndob = 1979-05-27\n",
        Format::Toml,
    )
    .unwrap();
    assert_eq!(value.get("title"), Some(&Value::from("t")));
    let owner = value.get("owner").unwrap();
    assert_eq!(owner.get("name"), Some(&Value::from("ada")));
    let dob: Timestamp = "1979-05-27".parse().unwrap();
    assert_eq!(owner.get("dob"), Some(&Value::Timestamp(dob)));
}

#[test]
fn toml_error_has_location() {
    let err = decode_str("a = 1\nb = \n", Format::Toml).unwrap_err();
    match err {
        ConvertError::Decode {
            format, location, ..
        } => {
            assert_eq!(format, Format::Toml);
            assert_eq!(location.map(|l| l.line), Some(2));
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
}

#[test]
fn json_document() {
    let value = decode_str(r#"{"b": [1, 2.5, null], "a": {"x": true}}"#, Format::Json).unwrap();
    assert_eq!(
        value,
        pairs(&[
            (
                "b",
                Value::Sequence(vec![Value::from(1i64), Value::from(2.5), Value::Null])
            ),
            ("a", pairs(&[("x", Value::from(true))])),
        ])
    );
}

#[test]
fn json_error_has_location() {
    let err = decode_str("{\n  \"a\": \n}", Format::Json).unwrap_err();
    match err {
        ConvertError::Decode { location, .. } => {
            assert_eq!(location.map(|l| l.line), Some(3));
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
}
