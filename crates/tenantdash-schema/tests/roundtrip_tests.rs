//! Load/dump round-trip properties

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tenantdash_schema::prelude::*;
use tenantdash_schema::{get_leaves, pop_leaf, add_leaf, LeafPath};

static OPTIONS: Schema = Schema {
    name: "Options",
    fields: &[
        FieldSpec::optional("host", FieldKind::String),
        FieldSpec::optional("port", FieldKind::Integer),
    ],
};

static VISUAL: Schema = Schema {
    name: "Visual",
    fields: &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("options", FieldKind::AnyObject),
    ],
};

static RECORD: Schema = Schema {
    name: "Record",
    fields: &[
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::with_default("kind", FieldKind::String, DefaultValue::Str("redshift")).wire("type"),
        FieldSpec::optional("options", FieldKind::Nested(&OPTIONS)),
        FieldSpec::optional("visuals", FieldKind::NestedList(&VISUAL)),
    ],
};

#[derive(Debug, Serialize, Deserialize)]
struct Options {
    host: Option<String>,
    port: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Visual {
    name: String,
    options: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    id: Option<i64>,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    options: Option<Options>,
    visuals: Option<Vec<Visual>>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl Structured for Record {
    fn schema() -> &'static Schema {
        &RECORD
    }

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown_fields
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown_fields
    }
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
        proptest::collection::vec(any::<i32>(), 0..3).prop_map(|v| json!(v)),
    ]
}

fn extras() -> impl Strategy<Value = Map<String, Value>> {
    proptest::collection::btree_map("x_[a-z]{1,6}", scalar(), 0..4)
        .prop_map(|m| m.into_iter().collect())
}

fn record() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(any::<i64>()),
        "[a-z ]{1,12}",
        "[a-z]{1,8}",
        proptest::option::of((
            proptest::option::of("[a-z.]{1,10}"),
            proptest::option::of(0..65535i64),
            extras(),
        )),
        proptest::option::of(proptest::collection::vec(("[a-z]{1,6}", extras()), 0..3)),
        extras(),
    )
        .prop_map(|(id, name, kind, options, visuals, top)| {
            let mut obj = Map::new();
            obj.insert("id".into(), json!(id));
            obj.insert("name".into(), json!(name));
            obj.insert("type".into(), json!(kind));
            obj.insert(
                "options".into(),
                match options {
                    None => Value::Null,
                    Some((host, port, extra)) => {
                        let mut o = extra;
                        o.insert("host".into(), json!(host));
                        o.insert("port".into(), json!(port));
                        Value::Object(o)
                    }
                },
            );
            obj.insert(
                "visuals".into(),
                match visuals {
                    None => Value::Null,
                    Some(items) => Value::Array(
                        items
                            .into_iter()
                            .map(|(name, extra)| {
                                let mut v = extra;
                                v.insert("name".into(), json!(name));
                                v.insert("options".into(), json!({"series": [1, 2]}));
                                Value::Object(v)
                            })
                            .collect(),
                    ),
                },
            );
            obj.extend(top);
            Value::Object(obj)
        })
}

/// A raw record with optional keys sometimes left out, paired with its dump
///
/// Absent optional keys dump as `null`; an absent `type` dumps as its default.
fn sparse_record() -> impl Strategy<Value = (Value, Value)> {
    (
        proptest::option::of(proptest::option::of(any::<i64>())),
        "[a-z ]{1,12}",
        proptest::option::of("[a-z]{1,8}"),
        proptest::option::of(proptest::option::of((
            proptest::option::of(proptest::option::of("[a-z.]{1,10}")),
            proptest::option::of(proptest::option::of(0..65535i64)),
        ))),
        any::<bool>(),
    )
        .prop_map(|(id, name, kind, options, visuals_present)| {
            let mut raw = Map::new();
            let mut dumped = Map::new();

            if let Some(id) = id {
                raw.insert("id".into(), json!(id));
            }
            dumped.insert("id".into(), json!(id.flatten()));

            raw.insert("name".into(), json!(name));
            dumped.insert("name".into(), json!(name));

            if let Some(kind) = &kind {
                raw.insert("type".into(), json!(kind));
            }
            dumped.insert("type".into(), json!(kind.as_deref().unwrap_or("redshift")));

            match options {
                None => {
                    dumped.insert("options".into(), Value::Null);
                }
                Some(None) => {
                    raw.insert("options".into(), Value::Null);
                    dumped.insert("options".into(), Value::Null);
                }
                Some(Some((host, port))) => {
                    let mut o = Map::new();
                    if let Some(host) = &host {
                        o.insert("host".into(), json!(host));
                    }
                    if let Some(port) = port {
                        o.insert("port".into(), json!(port));
                    }
                    raw.insert("options".into(), Value::Object(o));
                    dumped.insert(
                        "options".into(),
                        json!({"host": host.flatten(), "port": port.flatten()}),
                    );
                }
            }

            if visuals_present {
                raw.insert("visuals".into(), Value::Null);
            }
            dumped.insert("visuals".into(), Value::Null);

            (Value::Object(raw), Value::Object(dumped))
        })
}

proptest! {
    #[test]
    fn prop_absent_optionals_dump_as_null_or_default((raw, dumped) in sparse_record()) {
        let loaded = Record::load(&raw).unwrap();
        prop_assert!(loaded.unknown_fields().is_empty());
        prop_assert_eq!(loaded.dump().unwrap(), dumped);
    }

    #[test]
    fn prop_dump_of_load_is_identity(raw in record()) {
        let loaded = Record::load(&raw).unwrap();
        prop_assert_eq!(loaded.dump().unwrap(), raw);
    }

    #[test]
    fn prop_pop_then_add_restores_object(raw in record()) {
        let original = raw.clone();
        let mut obj = raw;
        let leaves = get_leaves(&obj);

        for (path, value) in &leaves {
            let popped = pop_leaf(&mut obj, path).unwrap();
            prop_assert_eq!(&popped, value);
            add_leaf(&mut obj, path, popped).unwrap();
        }
        prop_assert_eq!(obj, original);
    }
}

/// Unknown keys inside list elements are addressed by index
#[test]
fn test_unknown_field_inside_list_element() {
    let raw = json!({
        "id": 1,
        "name": "n",
        "type": "pg",
        "options": null,
        "visuals": [{"name": "a", "options": {}}, {"name": "b", "options": {}, "x_extra": 7}],
    });
    let record = Record::load(&raw).unwrap();

    let path = LeafPath::from_keys(["visuals"]).child_index(1).child_key("x_extra");
    assert_eq!(record.unknown_fields().get(&path), Some(&json!(7)));
    assert_eq!(record.dump().unwrap(), raw);
}

/// Only the required key is present
#[test]
fn test_minimal_record_fills_defaults() {
    let record = Record::load(&json!({"name": "n"})).unwrap();

    assert_eq!(record.kind, "redshift");
    assert_eq!(
        record.dump().unwrap(),
        json!({"id": null, "name": "n", "type": "redshift", "options": null, "visuals": null})
    );
}

/// A genuine error alongside an unknown field still fails
#[test]
fn test_mixed_errors_fail() {
    let raw = json!({"name": 5, "x_extra": true});
    let err = Record::load(&raw).unwrap_err();

    assert!(matches!(err, SchemaError::Invalid { .. }));
}
