//! Descriptor-driven validation of JSON payloads
//!
//! Every failure is collected with its path; validation never stops at the
//! first problem. Keys not declared by the schema are reported as
//! [`FieldErrorKind::UnknownField`] so callers can separate them from
//! genuine failures.

use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::descriptor::{FieldKind, Schema};
use crate::error::{FieldErrorKind, ValidationErrors};
use crate::leaf::{LeafPath, PathSegment};

static EMAIL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Validate `value` against `schema`
///
/// Returns every failure found. An empty collection means the payload is
/// valid.
#[must_use]
pub fn validate(schema: &Schema, value: &Value) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    match value {
        Value::Object(map) => validate_object(schema, map, &LeafPath::root(), &mut errors),
        _ => errors.push(LeafPath::root(), FieldErrorKind::WrongType { expected: "object" }),
    }
    errors
}

fn validate_object(
    schema: &Schema,
    map: &Map<String, Value>,
    path: &LeafPath,
    errors: &mut ValidationErrors,
) {
    for field in schema.fields {
        let field_path = path.child_key(field.wire_key);
        match map.get(field.wire_key) {
            None => {
                if field.required {
                    errors.push(field_path, FieldErrorKind::MissingField);
                }
            }
            Some(Value::Null) => {
                if !field.nullable && !matches!(field.kind, FieldKind::Any) {
                    errors.push(field_path, FieldErrorKind::NullNotAllowed);
                }
            }
            Some(value) => validate_value(&field.kind, value, &field_path, errors),
        }
    }

    for key in map.keys() {
        if schema.field(key).is_none() {
            errors.push(path.child_key(key.as_str()), FieldErrorKind::UnknownField);
        }
    }
}

fn validate_value(kind: &FieldKind, value: &Value, path: &LeafPath, errors: &mut ValidationErrors) {
    let wrong = || FieldErrorKind::WrongType {
        expected: kind.describe(),
    };

    match kind {
        FieldKind::Any => {}
        FieldKind::Integer => {
            if !(value.is_i64() || value.is_u64()) {
                errors.push(path.clone(), wrong());
            }
        }
        FieldKind::Number => {
            if !value.is_number() {
                errors.push(path.clone(), wrong());
            }
        }
        FieldKind::Boolean => {
            if !value.is_boolean() {
                errors.push(path.clone(), wrong());
            }
        }
        FieldKind::String => {
            if !value.is_string() {
                errors.push(path.clone(), wrong());
            }
        }
        FieldKind::DateTime => match value.as_str() {
            Some(s) if DateTime::parse_from_rfc3339(s).is_ok() => {}
            Some(_) => errors.push(path.clone(), FieldErrorKind::InvalidFormat { format: "datetime" }),
            None => errors.push(path.clone(), wrong()),
        },
        FieldKind::Email => match value.as_str() {
            Some(s) if is_email(s) => {}
            Some(_) => errors.push(path.clone(), FieldErrorKind::InvalidFormat { format: "email" }),
            None => errors.push(path.clone(), wrong()),
        },
        FieldKind::AnyObject => {
            if !value.is_object() {
                errors.push(path.clone(), wrong());
            }
        }
        FieldKind::Nested(schema) => match value {
            Value::Object(map) => validate_object(schema, map, path, errors),
            _ => errors.push(path.clone(), wrong()),
        },
        FieldKind::NestedList(schema) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = path.child_index(i);
                    match item {
                        Value::Object(map) => validate_object(schema, map, &item_path, errors),
                        _ => errors.push(item_path, FieldErrorKind::WrongType { expected: "object" }),
                    }
                }
            }
            _ => errors.push(path.clone(), wrong()),
        },
        FieldKind::List(inner) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_value(inner, item, &path.child_index(i), errors);
                }
            }
            _ => errors.push(path.clone(), wrong()),
        },
        FieldKind::Map(inner) => match value {
            Value::Object(map) => {
                for (key, item) in map {
                    validate_value(inner, item, &path.child_key(key.as_str()), errors);
                }
            }
            _ => errors.push(path.clone(), wrong()),
        },
        FieldKind::OneOf(kinds) => {
            let matched = kinds.iter().any(|k| {
                let mut branch = ValidationErrors::new();
                validate_value(k, value, path, &mut branch);
                branch.is_empty()
            });
            if !matched {
                errors.push(path.clone(), wrong());
            }
        }
    }
}

fn is_email(s: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(s))
}

/// Fill absent fields that declare a default, recursing into nested objects
pub fn apply_defaults(schema: &Schema, value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    for field in schema.fields {
        if let Some(default) = field.default {
            map.entry(field.wire_key.to_string())
                .or_insert_with(|| default.to_json());
        }
        match (field.kind, map.get_mut(field.wire_key)) {
            (FieldKind::Nested(inner), Some(nested)) => apply_defaults(inner, nested),
            (FieldKind::NestedList(inner), Some(Value::Array(items))) => {
                for item in items {
                    apply_defaults(inner, item);
                }
            }
            _ => {}
        }
    }
}

/// Remove load-only fields, recursing into nested objects
pub fn strip_load_only(schema: &Schema, value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    for field in schema.fields.iter().filter(|f| f.load_only) {
        map.remove(field.wire_key);
    }
    for field in schema.dump_fields() {
        match (field.kind, map.get_mut(field.wire_key)) {
            (FieldKind::Nested(inner), Some(nested)) => strip_load_only(inner, nested),
            (FieldKind::NestedList(inner), Some(Value::Array(items))) => {
                for item in items {
                    strip_load_only(inner, item);
                }
            }
            _ => {}
        }
    }
}

/// Check if `path` lies under a load-only field
///
/// Such paths have no parent once the field is stripped on dump.
#[must_use]
pub fn is_load_only_path(schema: &Schema, path: &LeafPath) -> bool {
    let mut current = schema;
    let mut segments = path.segments().iter();

    while let Some(segment) = segments.next() {
        let PathSegment::Key(key) = segment else {
            return false;
        };
        let Some(field) = current.field(key) else {
            return false;
        };
        if field.load_only {
            return true;
        }
        match field.kind {
            FieldKind::Nested(inner) => current = inner,
            FieldKind::NestedList(inner) => {
                if !matches!(segments.next(), Some(PathSegment::Index(_))) {
                    return false;
                }
                current = inner;
            }
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DefaultValue, FieldSpec};
    use serde_json::json;

    static OPTIONS: Schema = Schema {
        name: "Options",
        fields: &[
            FieldSpec::required("host", FieldKind::String),
            FieldSpec::optional("port", FieldKind::Integer),
        ],
    };

    static SOURCE: Schema = Schema {
        name: "Source",
        fields: &[
            FieldSpec::optional("id", FieldKind::Integer),
            FieldSpec::required("name", FieldKind::String),
            FieldSpec::with_default("kind", FieldKind::String, DefaultValue::Str("redshift")).wire("type"),
            FieldSpec::optional("options", FieldKind::Nested(&OPTIONS)),
            FieldSpec::optional("created_at", FieldKind::DateTime),
            FieldSpec::optional("email", FieldKind::Email),
            FieldSpec::optional("tags", FieldKind::List(&FieldKind::String)),
            FieldSpec::optional("value", FieldKind::OneOf(&[FieldKind::Integer, FieldKind::String])),
            FieldSpec::optional("groups", FieldKind::Any).load_only(),
        ],
    };

    #[test]
    fn valid_payload_has_no_errors() {
        let value = json!({
            "id": 1,
            "name": "db",
            "type": "pg",
            "options": {"host": "h", "port": 5439},
            "created_at": "2024-01-02T03:04:05+00:00",
            "email": "a@b.io",
            "tags": ["x"],
            "value": "text",
        });
        assert!(validate(&SOURCE, &value).is_empty());
    }

    #[test]
    fn unknown_keys_at_any_depth() {
        let value = json!({"name": "db", "extra": 1, "options": {"host": "h", "region": "x"}});
        let errors = validate(&SOURCE, &value);

        assert!(errors.only_unknown_fields());
        assert_eq!(
            errors.unknown_paths(),
            vec![
                LeafPath::from_keys(["options", "region"]),
                LeafPath::from_keys(["extra"]),
            ]
        );
    }

    #[test]
    fn missing_required_and_wrong_types() {
        let value = json!({"id": "one", "options": {}, "tags": [1]});
        let errors = validate(&SOURCE, &value);
        let kinds: Vec<_> = errors.iter().map(|e| (e.path.to_string(), e.kind.clone())).collect();

        assert!(kinds.contains(&("id".into(), FieldErrorKind::WrongType { expected: "integer" })));
        assert!(kinds.contains(&("name".into(), FieldErrorKind::MissingField)));
        assert!(kinds.contains(&("options.host".into(), FieldErrorKind::MissingField)));
        assert!(kinds.contains(&("tags.0".into(), FieldErrorKind::WrongType { expected: "string" })));
    }

    #[test]
    fn null_only_where_allowed() {
        let value = json!({"name": "db", "type": null, "options": null});
        let errors = validate(&SOURCE, &value);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().map(|e| e.path.to_string()), Some("type".into()));
    }

    #[test]
    fn formats_are_checked() {
        let value = json!({"name": "db", "created_at": "yesterday", "email": "nope"});
        let errors = validate(&SOURCE, &value);

        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e.kind, FieldErrorKind::InvalidFormat { .. })));
    }

    #[test]
    fn one_of_rejects_other_kinds() {
        let value = json!({"name": "db", "value": true});
        assert_eq!(validate(&SOURCE, &value).len(), 1);
    }

    #[test]
    fn non_object_payload() {
        let errors = validate(&SOURCE, &json!([1]));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn defaults_fill_absent_keys_only() {
        let mut absent = json!({"name": "db"});
        apply_defaults(&SOURCE, &mut absent);
        assert_eq!(absent["type"], json!("redshift"));

        let mut present = json!({"name": "db", "type": "pg"});
        apply_defaults(&SOURCE, &mut present);
        assert_eq!(present["type"], json!("pg"));
    }

    #[test]
    fn load_only_paths() {
        assert!(is_load_only_path(&SOURCE, &LeafPath::from_keys(["groups", "x"])));
        assert!(!is_load_only_path(&SOURCE, &LeafPath::from_keys(["options", "region"])));
        assert!(!is_load_only_path(&SOURCE, &LeafPath::from_keys(["extra"])));
    }

    #[test]
    fn load_only_is_stripped() {
        let mut value = json!({"name": "db", "groups": [1, 2]});
        strip_load_only(&SOURCE, &mut value);
        assert_eq!(value, json!({"name": "db"}));
    }

    static BOARD: Schema = Schema {
        name: "Board",
        fields: &[
            FieldSpec::required("name", FieldKind::String),
            FieldSpec::optional("sources", FieldKind::NestedList(&SOURCE)),
        ],
    };

    #[test]
    fn nested_load_only_is_stripped() {
        let mut value = json!({
            "name": "b",
            "sources": [{"name": "db", "groups": [1]}, {"name": "dw"}],
        });
        strip_load_only(&BOARD, &mut value);
        assert_eq!(value, json!({"name": "b", "sources": [{"name": "db"}, {"name": "dw"}]}));
    }
}
