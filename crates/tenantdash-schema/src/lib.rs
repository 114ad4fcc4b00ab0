//! Tenantdash Schema
//!
//! Explicit wire schemas for loosely structured REST payloads.
//!
//! # Core Concepts
//!
//! - [`Schema`] / [`FieldSpec`]: per-type field descriptor tables
//! - [`validate`]: collects every failure with its [`LeafPath`]
//! - [`Structured`]: load/dump that keeps unmodeled fields in an
//!   [`UnknownFields`] sidecar so `dump(load(x)) == x`
//! - [`get_leaves`], [`pop_leaf`], [`add_leaf`]: path addressing over nested
//!   JSON objects
//!
//! # Example
//!
//! ```rust,ignore
//! use tenantdash_schema::Structured;
//!
//! let source = DataSource::load(&raw)?;
//! assert_eq!(source.dump()?, raw);
//! ```

#![warn(unreachable_pub)]

pub mod descriptor;
pub mod error;
pub mod leaf;
pub mod structured;
pub mod validator;

pub use descriptor::{DefaultValue, FieldKind, FieldSpec, Schema};
pub use error::{FieldError, FieldErrorKind, SchemaError, ValidationErrors};
pub use leaf::{add_leaf, get_leaves, pop_leaf, Leaf, LeafError, LeafPath, PathSegment};
pub use structured::{Structured, UnknownFields};
pub use validator::validate;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        DefaultValue, FieldKind, FieldSpec, Schema, SchemaError, Structured, UnknownFields,
    };
}
