//! Field descriptors
//!
//! A [`Schema`] lists the wire fields of one entity type: their JSON key,
//! expected kind, whether they are required or nullable, whether they are
//! only accepted on load, and an optional default applied when absent.
//!
//! Descriptors are plain `const` data so every entity schema lives in a
//! `static`.

use serde_json::Value;

/// Expected shape of a field value
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// JSON integer (`i64`)
    Integer,
    /// Any JSON number
    Number,
    /// JSON string
    String,
    /// JSON boolean
    Boolean,
    /// RFC 3339 timestamp string
    DateTime,
    /// Email address string
    Email,
    /// Anything, including null
    Any,
    /// Any JSON object, contents unchecked
    AnyObject,
    /// Object validated against another schema
    Nested(&'static Schema),
    /// Array of objects validated against another schema
    NestedList(&'static Schema),
    /// Array whose elements have the given kind
    List(&'static FieldKind),
    /// Object whose values have the given kind
    Map(&'static FieldKind),
    /// Value matching at least one of the given kinds
    OneOf(&'static [FieldKind]),
}

impl FieldKind {
    /// Short name used in error messages
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Email => "email",
            Self::Any => "any",
            Self::AnyObject | Self::Nested(_) | Self::Map(_) => "object",
            Self::NestedList(_) | Self::List(_) => "list",
            Self::OneOf(_) => "one of several kinds",
        }
    }
}

/// Default applied when a field is absent on load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Boolean default
    Bool(bool),
    /// Integer default
    Int(i64),
    /// String default
    Str(&'static str),
}

impl DefaultValue {
    /// Convert to JSON
    #[must_use]
    pub fn to_json(self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Int(i) => Value::from(i),
            Self::Str(s) => Value::String(s.to_string()),
        }
    }
}

/// Description of one wire field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name on the typed side
    pub name: &'static str,
    /// JSON key on the wire
    pub wire_key: &'static str,
    /// Expected value kind
    pub kind: FieldKind,
    /// Must be present on load and dump
    pub required: bool,
    /// Null is accepted
    pub nullable: bool,
    /// Accepted on load, dropped on dump
    pub load_only: bool,
    /// Applied when absent on load
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    /// Required, non-null field
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            wire_key: name,
            kind,
            required: true,
            nullable: false,
            load_only: false,
            default: None,
        }
    }

    /// Optional, nullable field
    #[must_use]
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            wire_key: name,
            kind,
            required: false,
            nullable: true,
            load_only: false,
            default: None,
        }
    }

    /// Optional, non-null field with a default
    #[must_use]
    pub const fn with_default(name: &'static str, kind: FieldKind, default: DefaultValue) -> Self {
        Self {
            name,
            wire_key: name,
            kind,
            required: false,
            nullable: false,
            load_only: false,
            default: Some(default),
        }
    }

    /// Use a different JSON key on the wire
    #[must_use]
    pub const fn wire(mut self, key: &'static str) -> Self {
        self.wire_key = key;
        self
    }

    /// Accept null
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accept on load only
    #[must_use]
    pub const fn load_only(mut self) -> Self {
        self.load_only = true;
        self
    }
}

/// Field descriptors of one entity type
#[derive(Debug)]
pub struct Schema {
    /// Entity name, used in error messages
    pub name: &'static str,
    /// Known wire fields
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Look up a field by its wire key
    #[must_use]
    pub fn field(&self, wire_key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.wire_key == wire_key)
    }

    /// Iterate over fields emitted on dump
    pub fn dump_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.load_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: Schema = Schema {
        name: "Inner",
        fields: &[FieldSpec::required("host", FieldKind::String)],
    };

    static OUTER: Schema = Schema {
        name: "Outer",
        fields: &[
            FieldSpec::required("id", FieldKind::Integer),
            FieldSpec::optional("kind", FieldKind::String).wire("type"),
            FieldSpec::optional("inner", FieldKind::Nested(&INNER)),
            FieldSpec::optional("groups", FieldKind::Any).load_only(),
            FieldSpec::with_default("draft", FieldKind::Boolean, DefaultValue::Bool(false)),
        ],
    };

    #[test]
    fn lookup_uses_wire_key() {
        assert_eq!(OUTER.field("type").map(|f| f.name), Some("kind"));
        assert!(OUTER.field("kind").is_none());
    }

    #[test]
    fn dump_fields_skip_load_only() {
        let names: Vec<_> = OUTER.dump_fields().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "kind", "inner", "draft"]);
    }

    #[test]
    fn defaults_convert_to_json() {
        assert_eq!(DefaultValue::Bool(true).to_json(), Value::Bool(true));
        assert_eq!(DefaultValue::Str("redshift").to_json(), Value::from("redshift"));
        assert_eq!(DefaultValue::Int(7).to_json(), Value::from(7));
    }
}
