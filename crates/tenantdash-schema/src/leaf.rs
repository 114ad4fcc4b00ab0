//! Leaf paths over nested JSON objects
//!
//! A leaf is a value reached by descending through objects only; its
//! [`LeafPath`] is the sequence of keys from the root. Paths may also step
//! through arrays by index, which is how fields inside list elements are
//! addressed (e.g. `visualizations.0.extra`).

use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

/// One step of a [`LeafPath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array position
    Index(usize),
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Path from the root of a JSON object to one of its values
///
/// # Examples
/// - `["options", "host"]` → `options.host`
/// - `["visualizations", 0, "extra"]` → `visualizations.0.extra`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafPath(Vec<PathSegment>);

impl LeafPath {
    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Empty path (the root object itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create path made only of object keys
    #[must_use]
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| PathSegment::Key(k.into())).collect())
    }

    /// Append an object key, returning new path
    #[inline]
    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.0.push(PathSegment::Key(key.into()));
        path
    }

    /// Append an array index, returning new path
    #[inline]
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.0.push(PathSegment::Index(index));
        path
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path made of the first `len` segments
    #[inline]
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }
}

impl Display for LeafPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// A leaf path together with the value found there
pub type Leaf = (LeafPath, Value);

/// Errors when addressing a value by path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeafError {
    /// The root cannot be popped or replaced
    #[error("leaf path is empty")]
    EmptyPath,

    /// Some segment of the path does not exist
    #[error("no value at '{path}'")]
    Missing { path: String },
}

/// Collect every leaf reachable by descending through objects
///
/// Empty objects contribute no leaves. Arrays are leaves, not containers.
///
/// # Examples
/// `{"a": {"b": 1, "c": 2}}` → `[(a.b, 1), (a.c, 2)]`
#[must_use]
pub fn get_leaves(obj: &Value) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    if let Value::Object(map) = obj {
        collect_leaves(map, &LeafPath::root(), &mut leaves);
    }
    leaves
}

fn collect_leaves(map: &Map<String, Value>, prefix: &LeafPath, out: &mut Vec<Leaf>) {
    for (key, value) in map {
        let path = prefix.child_key(key.as_str());
        match value {
            Value::Object(inner) => collect_leaves(inner, &path, out),
            other => out.push((path, other.clone())),
        }
    }
}

/// Remove and return the value at `path`, mutating ancestors in place
///
/// # Errors
/// Returns [`LeafError::Missing`] if any segment does not exist.
pub fn pop_leaf(obj: &mut Value, path: &LeafPath) -> Result<Value, LeafError> {
    let (parent, last) = parent_of(obj, path)?;
    let removed = match (parent, last) {
        (Value::Object(map), PathSegment::Key(key)) => map.remove(key),
        (Value::Array(items), PathSegment::Index(index)) if *index < items.len() => {
            Some(items.remove(*index))
        }
        _ => None,
    };
    removed.ok_or_else(|| LeafError::Missing {
        path: path.to_string(),
    })
}

/// Insert `value` at `path`
///
/// No intermediate containers are created: every ancestor must already
/// exist. A path of length 1 addresses a top-level key directly.
///
/// # Errors
/// Returns [`LeafError::Missing`] if an ancestor does not exist.
pub fn add_leaf(obj: &mut Value, path: &LeafPath, value: Value) -> Result<(), LeafError> {
    let (parent, last) = parent_of(obj, path)?;
    match (parent, last) {
        (Value::Object(map), PathSegment::Key(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(items), PathSegment::Index(index)) if *index < items.len() => {
            items[*index] = value;
            Ok(())
        }
        (Value::Array(items), PathSegment::Index(index)) if *index == items.len() => {
            items.push(value);
            Ok(())
        }
        _ => Err(LeafError::Missing {
            path: path.to_string(),
        }),
    }
}

/// Walk to the container holding the last segment of `path`
fn parent_of<'a, 'p>(
    obj: &'a mut Value,
    path: &'p LeafPath,
) -> Result<(&'a mut Value, &'p PathSegment), LeafError> {
    let (last, ancestors) = path.0.split_last().ok_or(LeafError::EmptyPath)?;

    let mut current = obj;
    for (depth, segment) in ancestors.iter().enumerate() {
        let next = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            _ => None,
        };
        current = next.ok_or_else(|| LeafError::Missing {
            path: path.prefix(depth + 1).to_string(),
        })?;
    }

    Ok((current, last))
}
