//! Testing utilities for the tenantdash workspace
//!
//! Shared fakes for the BI service and the SQL collaborator.

#![allow(missing_docs)]

mod fake_service;
mod scripted;
mod sql;

pub use fake_service::{FakeService, DEFAULT_GROUP_ID, TIMESTAMP};
pub use scripted::ScriptedBackend;
pub use sql::RecordingSqlExecutor;
