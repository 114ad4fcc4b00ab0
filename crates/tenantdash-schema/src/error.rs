//! Schema error types

use std::fmt::{self, Display, Formatter};

use crate::leaf::{LeafError, LeafPath};

/// Why a single field failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// Key not declared by the schema
    UnknownField,
    /// Required key absent
    MissingField,
    /// Null given for a non-nullable field
    NullNotAllowed,
    /// Value has the wrong JSON type
    WrongType {
        /// Expected kind
        expected: &'static str,
    },
    /// String does not match the required format
    InvalidFormat {
        /// Format name
        format: &'static str,
    },
}

impl Display for FieldErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField => write!(f, "Unknown field."),
            Self::MissingField => write!(f, "Missing data for required field."),
            Self::NullNotAllowed => write!(f, "Field may not be null."),
            Self::WrongType { expected } => write!(f, "Not a valid {expected}."),
            Self::InvalidFormat { format } => write!(f, "Not a valid {format}."),
        }
    }
}

/// A validation failure at one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Location of the offending key
    pub path: LeafPath,
    /// Failure kind
    pub kind: FieldErrorKind,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Collected validation failures for one object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure
    #[inline]
    pub fn push(&mut self, path: LeafPath, kind: FieldErrorKind) {
        self.0.push(FieldError { path, kind });
    }

    /// Absorb another collection
    #[inline]
    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// Check if no failures were recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failures
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate failures
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// True when every recorded failure is an unknown field
    #[must_use]
    pub fn only_unknown_fields(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .iter()
                .all(|e| e.kind == FieldErrorKind::UnknownField)
    }

    /// Paths of all unknown-field failures
    #[must_use]
    pub fn unknown_paths(&self) -> Vec<LeafPath> {
        self.0
            .iter()
            .filter(|e| e.kind == FieldErrorKind::UnknownField)
            .map(|e| e.path.clone())
            .collect()
    }

    /// Drop unknown-field failures
    #[must_use]
    pub fn without_unknown(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|e| e.kind != FieldErrorKind::UnknownField)
                .collect(),
        )
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Schema errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Payload violates the schema
    #[error("{schema} failed validation: {errors}")]
    Invalid {
        /// Schema name
        schema: &'static str,
        /// Failures other than unknown fields
        errors: ValidationErrors,
    },

    /// Validated payload could not be decoded into the typed value
    #[error("{schema} could not be decoded: {source}")]
    Decode {
        /// Schema name
        schema: &'static str,
        /// Underlying serde error
        source: serde_json::Error,
    },

    /// Typed value could not be encoded
    #[error("{schema} could not be encoded: {source}")]
    Encode {
        /// Schema name
        schema: &'static str,
        /// Underlying serde error
        source: serde_json::Error,
    },

    /// One element of a list failed
    #[error("item {index}: {source}")]
    Item {
        /// Position in the list
        index: usize,
        /// Element failure
        source: Box<SchemaError>,
    },

    /// List payload expected
    #[error("{schema} list expected, got {found}")]
    NotAList {
        /// Schema name
        schema: &'static str,
        /// JSON type found instead
        found: &'static str,
    },

    /// Unknown-field sidecar could not be applied
    #[error(transparent)]
    Leaf(#[from] LeafError),
}

impl SchemaError {
    /// Validation failures, if this is a validation error
    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid { errors, .. } => Some(errors),
            Self::Item { source, .. } => source.validation_errors(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors() -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.push(LeafPath::from_keys(["extra"]), FieldErrorKind::UnknownField);
        errors.push(LeafPath::from_keys(["id"]), FieldErrorKind::MissingField);
        errors
    }

    #[test]
    fn unknown_detection() {
        let all = errors();
        assert!(!all.only_unknown_fields());
        assert_eq!(all.unknown_paths(), vec![LeafPath::from_keys(["extra"])]);

        let genuine = all.without_unknown();
        assert_eq!(genuine.len(), 1);
        assert!(!genuine.only_unknown_fields());
    }

    #[test]
    fn empty_is_not_only_unknown() {
        assert!(!ValidationErrors::new().only_unknown_fields());
    }

    #[test]
    fn display_joins_failures() {
        assert_eq!(
            errors().to_string(),
            "extra: Unknown field.; id: Missing data for required field."
        );
    }
}
