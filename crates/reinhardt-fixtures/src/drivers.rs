//! Fixture drivers.
//!
//! A driver builds the records of one table's [`FixtureSet`], persists them
//! through its executor and tracks every table it writes to.
//!
//! - [`StandardDriver`] works from table and column names alone.
//! - [`ModelDriver`] resolves a registered model for the table and uses its
//!   declared relations and attribute names.

pub mod model;
pub mod standard;

pub use model::{ModelDriver, ModelMetadata, ModelRegistry};
pub use standard::StandardDriver;

use indexmap::IndexMap;

use crate::error::FixtureResult;
use crate::record::Record;
use crate::tracker::TruncationTracker;
use crate::value::FixtureSet;

/// Records built by one driver call, keyed by label in fixture order.
pub type BuiltRecords = IndexMap<String, Record>;

/// Shared contract of the fixture drivers.
pub trait FixtureDriver {
	/// Builds and persists every fixture of `table`.
	///
	/// The table is tracked for truncation before anything is built. All
	/// records are built before the first row is written, so a relation
	/// error leaves the database untouched.
	///
	/// # Errors
	///
	/// Any error aborts the whole call. Tables touched so far stay tracked.
	fn build_records(&mut self, table: &str, fixtures: &FixtureSet) -> FixtureResult<BuiltRecords>;

	/// Empties every table touched since the last truncation.
	///
	/// Returns the number of tables emptied.
	fn truncate(&mut self) -> FixtureResult<usize>;

	/// Tables touched since the last truncation.
	fn tracker(&self) -> &TruncationTracker;
}

impl<D: FixtureDriver + ?Sized> FixtureDriver for Box<D> {
	fn build_records(&mut self, table: &str, fixtures: &FixtureSet) -> FixtureResult<BuiltRecords> {
		(**self).build_records(table, fixtures)
	}

	fn truncate(&mut self) -> FixtureResult<usize> {
		(**self).truncate()
	}

	fn tracker(&self) -> &TruncationTracker {
		(**self).tracker()
	}
}

impl<D: FixtureDriver + ?Sized> FixtureDriver for &mut D {
	fn build_records(&mut self, table: &str, fixtures: &FixtureSet) -> FixtureResult<BuiltRecords> {
		(**self).build_records(table, fixtures)
	}

	fn truncate(&mut self) -> FixtureResult<usize> {
		(**self).truncate()
	}

	fn tracker(&self) -> &TruncationTracker {
		(**self).tracker()
	}
}
