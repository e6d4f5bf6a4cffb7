//! Label-keyed test fixtures for the Reinhardt framework.
//!
//! Fixtures are declared per table as a mapping from a *label* to column
//! values. Every label is turned into a deterministic integer key, so fixtures
//! can refer to each other by label without knowing any database ids:
//!
//! - **Deterministic keys**: `george` always gets the same id, across runs and
//!   processes (CRC32 by default, SHA-1 optionally)
//! - **Relations**: BelongsTo references become foreign keys, BelongsToMany
//!   references become join-table rows with optional pivot columns
//! - **Two drivers**: a schema-free driver working from table and column names,
//!   and a model driver working from registered model metadata
//! - **Cleanup**: every table written to is tracked and can be emptied in one call
//!
//! # Features
//!
//! - `sqlite` - [`StatementExecutor`] for `rusqlite::Connection` (enabled by default)
//! - `yaml` - YAML fixture file support
//! - `full` - All features enabled
//!
//! # Quick Start
//!
//! Create a fixture file (`tests/fixtures/parrots.json`):
//!
//! ```json
//! {
//!   "polly": { "id": 4, "name": "Polly" },
//!   "george": { "name": "George", "pirate_id": "blackbeard" }
//! }
//! ```
//!
//! Load it, use the records, clean up:
//!
//! ```ignore
//! use reinhardt_fixtures::prelude::*;
//!
//! let conn = rusqlite::Connection::open_in_memory()?;
//! let mut fixtures = Fixtures::new(StandardDriver::new(conn), DirectorySource::new("tests/fixtures"));
//!
//! fixtures.up(&["pirates", "parrots"])?;
//! let george = fixtures.get("parrots", "george").unwrap();
//! assert_eq!(george.get_i64("id"), Some(380982691));
//!
//! fixtures.down()?;
//! ```
//!
//! ## Building fixtures in code
//!
//! Fixtures built in code may compute values from the record being built:
//!
//! ```
//! use reinhardt_fixtures::prelude::*;
//! use reinhardt_fixtures::{columns, fixture_set};
//!
//! let pirates = fixture_set! {
//!     "blackbeard" => columns! {
//!         "name" => "Edward Teach",
//!         "title" => FixtureValue::computed(|ctx| {
//!             format!("{} the Pirate!", ctx.record.get_str("name").unwrap_or_default()).into()
//!         }),
//!     },
//! };
//!
//! let mut driver = StandardDriver::new(RecordingExecutor::new());
//! let records = driver.build_records("pirates", &pirates).unwrap();
//! assert_eq!(records["blackbeard"].get_str("title"), Some("Edward Teach the Pirate!"));
//! ```
//!
//! # Architecture
//!
//! - [`KeyGenerator`](keys::KeyGenerator) - label to key strategies
//! - [`RecordBuilder`](builder::RecordBuilder) - builds one record from one fixture
//! - [`RelationResolver`](relations::RelationResolver) - resolves relation-shaped columns
//! - [`FixtureDriver`](drivers::FixtureDriver) - builds, persists and tracks a table's fixtures
//! - [`TruncationTracker`](tracker::TruncationTracker) - touched tables and their cleanup
//! - [`FixtureSource`](source::FixtureSource) - where fixture sets come from
//! - [`Fixtures`](fixtures::Fixtures) - up/down harness for tests

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod config;
pub mod drivers;
pub mod error;
pub mod executor;
pub mod fixtures;
pub mod keys;
pub mod naming;
pub mod prelude;
pub mod record;
pub mod relations;
pub mod source;
pub mod tracker;
pub mod value;

// Re-export commonly used types at crate root
pub use config::{DriverKind, FixtureSettings};
pub use drivers::{FixtureDriver, ModelDriver, ModelMetadata, ModelRegistry, StandardDriver};
pub use error::{FixtureError, FixtureResult};
pub use executor::StatementExecutor;
pub use fixtures::Fixtures;
pub use keys::{Crc32KeyGenerator, KeyGenerator, KeyStrategy, Sha1KeyGenerator};
pub use record::{JoinLink, JoinRow, Record};
pub use relations::RelationDescriptor;
pub use value::{ColumnMap, FixtureSet, FixtureValue, SqlValue};
