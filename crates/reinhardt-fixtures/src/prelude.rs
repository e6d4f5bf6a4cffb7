//! Convenience re-exports for common usage.
//!
//! # Example
//!
//! ```
//! use reinhardt_fixtures::prelude::*;
//!
//! let keys = Crc32KeyGenerator::new();
//! assert_eq!(keys.generate_key("george"), 380982691);
//! ```

// Error types
pub use crate::error::{FixtureError, FixtureResult};

// Keys
pub use crate::keys::{Crc32KeyGenerator, KeyGenerator, KeyStrategy, Sha1KeyGenerator};

// Values and records
pub use crate::record::{JoinLink, JoinRow, Record};
pub use crate::value::{ColumnMap, ComputeContext, FixtureSet, FixtureValue, SqlValue};

// Relations and naming
pub use crate::naming::{AttributeCase, ForeignKeyConvention, SuffixConvention};
pub use crate::relations::{RelationDescriptor, RelationKind};

// Drivers and execution
pub use crate::drivers::{
	BuiltRecords, FixtureDriver, ModelDriver, ModelMetadata, ModelRegistry, StandardDriver,
};
pub use crate::executor::{RecordingExecutor, StatementExecutor};
pub use crate::tracker::TruncationTracker;

// Sources, settings and harness
pub use crate::config::{DriverKind, FixtureSettings};
pub use crate::fixtures::Fixtures;
pub use crate::source::{DirectorySource, FixtureFormat, FixtureParser, FixtureSource, MemorySource};
