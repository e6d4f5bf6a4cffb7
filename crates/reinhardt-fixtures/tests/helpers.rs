//! Test helpers for reinhardt-fixtures integration tests.
//!
//! This module provides the on-disk fixture data, the SQLite schema of the
//! pirate test domain and the matching model registry.

#![allow(dead_code)]

#[path = "helpers/schema.rs"]
pub mod schema;
#[path = "helpers/test_data.rs"]
pub mod test_data;
