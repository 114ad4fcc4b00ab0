//! Load and dump with unknown-field passthrough
//!
//! [`Structured::load`] validates a raw payload against the type's
//! [`Schema`]. When the only failures are unknown keys, those leaves are
//! popped into an [`UnknownFields`] sidecar and loading proceeds;
//! [`Structured::dump`] puts them back at their original paths. Any other
//! failure is reported in full.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::descriptor::Schema;
use crate::error::SchemaError;
use crate::leaf::{add_leaf, pop_leaf, Leaf, LeafPath};
use crate::validator::{apply_defaults, is_load_only_path, strip_load_only, validate};

/// Wire fields a type does not model, kept in load order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnknownFields(Vec<Leaf>);

impl UnknownFields {
    /// Create empty sidecar
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a field
    #[inline]
    pub fn push(&mut self, path: LeafPath, value: Value) {
        self.0.push((path, value));
    }

    /// Check if no fields were kept
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of kept fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate kept fields
    pub fn iter(&self) -> impl Iterator<Item = &Leaf> {
        self.0.iter()
    }

    /// Value kept at `path`
    #[must_use]
    pub fn get(&self, path: &LeafPath) -> Option<&Value> {
        self.0.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    /// Drop every kept field
    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<Leaf> for UnknownFields {
    fn from_iter<I: IntoIterator<Item = Leaf>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A typed value with an explicit wire schema
///
/// Implementors hold their sidecar in a `#[serde(skip)]` field and expose it
/// through [`Structured::unknown_fields`].
pub trait Structured: Serialize + DeserializeOwned {
    /// Wire schema for this type
    fn schema() -> &'static Schema;

    /// Fields kept from the last load
    fn unknown_fields(&self) -> &UnknownFields;

    /// Mutable access to the sidecar
    fn unknown_fields_mut(&mut self) -> &mut UnknownFields;

    /// Hook run after a successful load, for derived fields
    fn after_load(&mut self) {}

    /// Validate and decode a raw payload
    ///
    /// # Errors
    /// Returns [`SchemaError::Invalid`] listing every failure other than
    /// unknown fields, or [`SchemaError::Decode`] if the validated payload
    /// does not fit the type.
    fn load(raw: &Value) -> Result<Self, SchemaError> {
        let schema = Self::schema();
        let mut value = raw.clone();
        apply_defaults(schema, &mut value);

        let errors = validate(schema, &value);
        let mut sidecar = UnknownFields::new();

        if !errors.is_empty() {
            if !errors.only_unknown_fields() {
                return Err(SchemaError::Invalid {
                    schema: schema.name,
                    errors: errors.without_unknown(),
                });
            }

            for path in errors.unknown_paths() {
                let popped = pop_leaf(&mut value, &path)?;
                sidecar.push(path, popped);
            }

            let remaining = validate(schema, &value);
            if !remaining.is_empty() {
                return Err(SchemaError::Invalid {
                    schema: schema.name,
                    errors: remaining,
                });
            }
        }

        let mut entity: Self = serde_json::from_value(value).map_err(|source| SchemaError::Decode {
            schema: schema.name,
            source,
        })?;
        *entity.unknown_fields_mut() = sidecar;
        entity.after_load();
        Ok(entity)
    }

    /// Load each element of a JSON array
    ///
    /// # Errors
    /// Returns [`SchemaError::NotAList`] for non-array input, or
    /// [`SchemaError::Item`] for the first element that fails.
    fn load_many(raw: &Value) -> Result<Vec<Self>, SchemaError> {
        let Value::Array(items) = raw else {
            return Err(SchemaError::NotAList {
                schema: Self::schema().name,
                found: json_type(raw),
            });
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                Self::load(item).map_err(|e| SchemaError::Item {
                    index,
                    source: Box::new(e),
                })
            })
            .collect()
    }

    /// Encode to wire shape, reinjecting kept fields
    ///
    /// Kept fields under load-only fields are not reinjected.
    ///
    /// # Errors
    /// Returns [`SchemaError::Invalid`] if the encoded value does not
    /// validate, or [`SchemaError::Leaf`] if a kept field's parent is gone.
    fn dump(&self) -> Result<Value, SchemaError> {
        let schema = Self::schema();
        let mut value = serde_json::to_value(self).map_err(|source| SchemaError::Encode {
            schema: schema.name,
            source,
        })?;
        strip_load_only(schema, &mut value);

        let errors = validate(schema, &value);
        if !errors.is_empty() {
            return Err(SchemaError::Invalid {
                schema: schema.name,
                errors,
            });
        }

        for (path, leaf) in self.unknown_fields().iter() {
            if is_load_only_path(schema, path) {
                continue;
            }
            add_leaf(&mut value, path, leaf.clone())?;
        }
        Ok(value)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DefaultValue, FieldKind, FieldSpec};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    static OPTIONS: Schema = Schema {
        name: "Options",
        fields: &[FieldSpec::optional("host", FieldKind::String)],
    };

    static SOURCE: Schema = Schema {
        name: "Source",
        fields: &[
            FieldSpec::optional("id", FieldKind::Integer),
            FieldSpec::required("name", FieldKind::String),
            FieldSpec::with_default("kind", FieldKind::String, DefaultValue::Str("redshift")).wire("type"),
            FieldSpec::optional("options", FieldKind::Nested(&OPTIONS)),
            FieldSpec::optional("groups", FieldKind::Any).load_only(),
        ],
    };

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Options {
        host: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Source {
        id: Option<i64>,
        name: String,
        #[serde(rename = "type")]
        kind: String,
        options: Option<Options>,
        groups: Option<Value>,
        #[serde(skip)]
        unknown_fields: UnknownFields,
    }

    impl Structured for Source {
        fn schema() -> &'static Schema {
            &SOURCE
        }

        fn unknown_fields(&self) -> &UnknownFields {
            &self.unknown_fields
        }

        fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
            &mut self.unknown_fields
        }
    }

    #[test]
    fn load_clean_payload() {
        let raw = json!({"id": 1, "name": "db", "type": "pg", "options": {"host": "h"}, "groups": null});
        let source = Source::load(&raw).unwrap();

        assert_eq!(source.id, Some(1));
        assert_eq!(source.kind, "pg");
        assert!(source.unknown_fields().is_empty());
    }

    #[test]
    fn unknown_fields_round_trip() {
        let raw = json!({
            "id": 1,
            "name": "db",
            "type": "pg",
            "options": {"host": "h", "region": "eu"},
            "paused": 0,
        });
        let source = Source::load(&raw).unwrap();

        assert_eq!(source.unknown_fields().len(), 2);
        assert_eq!(
            source.unknown_fields().get(&LeafPath::from_keys(["options", "region"])),
            Some(&json!("eu"))
        );

        assert_eq!(source.dump().unwrap(), raw);
    }

    #[test]
    fn genuine_error_is_not_masked() {
        let raw = json!({"id": "one", "name": "db", "extra": true});
        let err = Source::load(&raw).unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(!errors.only_unknown_fields());
    }

    #[test]
    fn defaults_apply_on_load() {
        let source = Source::load(&json!({"name": "db"})).unwrap();
        assert_eq!(source.kind, "redshift");
    }

    #[test]
    fn load_only_not_dumped() {
        let source = Source::load(&json!({"name": "db", "groups": [1]})).unwrap();
        let dumped = source.dump().unwrap();

        assert!(dumped.get("groups").is_none());
        assert_eq!(dumped["type"], json!("redshift"));
    }

    #[test]
    fn load_many_reports_index() {
        let raw = json!([{"name": "a"}, {"name": 2}]);
        let err = Source::load_many(&raw).unwrap_err();

        assert!(matches!(err, SchemaError::Item { index: 1, .. }));
        assert!(Source::load_many(&json!({"name": "a"})).is_err());
    }

    #[test]
    fn dump_fails_when_parent_gone() {
        let mut source = Source::load(&json!({"name": "db", "options": {"region": "eu"}})).unwrap();
        source.options = None;

        assert!(matches!(source.dump(), Err(SchemaError::Leaf(_))));
    }
}
