//! Test harness.
//!
//! [`Fixtures`] pairs a driver with a source: `up` loads tables and keeps
//! their records addressable by label, `down` empties every touched table.
//!
//! ```
//! use reinhardt_fixtures::drivers::StandardDriver;
//! use reinhardt_fixtures::executor::RecordingExecutor;
//! use reinhardt_fixtures::fixtures::Fixtures;
//! use reinhardt_fixtures::source::MemorySource;
//! use reinhardt_fixtures::{columns, fixture_set};
//!
//! let source = MemorySource::new().with(
//!     "parrots",
//!     fixture_set! { "polly" => columns! { "id" => 4, "name" => "Polly" } },
//! );
//! let mut fixtures = Fixtures::new(StandardDriver::new(RecordingExecutor::new()), source);
//!
//! fixtures.up(&["parrots"]).unwrap();
//! assert_eq!(fixtures.get("parrots", "polly").and_then(|r| r.get_i64("id")), Some(4));
//!
//! fixtures.down().unwrap();
//! assert!(fixtures.get("parrots", "polly").is_none());
//! ```

use indexmap::{IndexMap, IndexSet};

use crate::config::FixtureSettings;
use crate::drivers::{BuiltRecords, FixtureDriver, ModelRegistry};
use crate::error::{FixtureError, FixtureResult};
use crate::executor::StatementExecutor;
use crate::record::Record;
use crate::source::{DirectorySource, FixtureSource};

/// A driver, a source and the records loaded so far.
#[derive(Debug)]
pub struct Fixtures<D, S> {
	driver: D,
	source: S,
	loaded: IndexMap<String, BuiltRecords>,
}

impl Fixtures<Box<dyn FixtureDriver>, DirectorySource> {
	/// Harness with the driver and directory source described by `settings`.
	pub fn from_settings<E: StatementExecutor + 'static>(
		settings: &FixtureSettings,
		executor: E,
		registry: ModelRegistry,
	) -> FixtureResult<Self> {
		Ok(Self::new(settings.driver(executor, registry)?, settings.source()))
	}
}

impl<D: FixtureDriver, S: FixtureSource> Fixtures<D, S> {
	/// Creates a harness.
	pub fn new(driver: D, source: S) -> Self {
		Self {
			driver,
			source,
			loaded: IndexMap::new(),
		}
	}

	/// Loads `tables` in order and returns the number of records loaded.
	///
	/// # Errors
	///
	/// [`FixtureError::InvalidConfiguration`] if a table is already loaded or
	/// listed twice; nothing is loaded in that case. Source and driver errors
	/// stop the load at the failing table.
	pub fn up(&mut self, tables: &[&str]) -> FixtureResult<usize> {
		let mut requested = IndexSet::new();
		for &table in tables {
			if self.loaded.contains_key(table) || !requested.insert(table) {
				return Err(FixtureError::InvalidConfiguration(format!(
					"fixtures for {} are already loaded",
					table
				)));
			}
		}

		let mut count = 0;
		for table in requested {
			let set = self.source.fixture_set(table)?;
			let records = self.driver.build_records(table, &set)?;
			count += records.len();
			self.loaded.insert(table.to_string(), records);
		}
		Ok(count)
	}

	/// Loads every table the source knows about, in the source's order.
	pub fn up_all(&mut self) -> FixtureResult<usize> {
		let tables = self.source.tables()?;
		let tables: Vec<&str> = tables.iter().map(String::as_str).collect();
		self.up(&tables)
	}

	/// Empties every touched table and forgets the loaded records.
	///
	/// Returns the number of tables emptied.
	pub fn down(&mut self) -> FixtureResult<usize> {
		let count = self.driver.truncate()?;
		self.loaded.clear();
		Ok(count)
	}

	/// A loaded record.
	pub fn get(&self, table: &str, label: &str) -> Option<&Record> {
		self.loaded.get(table).and_then(|records| records.get(label))
	}

	/// All loaded records of `table`.
	pub fn records(&self, table: &str) -> Option<&BuiltRecords> {
		self.loaded.get(table)
	}

	/// Loaded tables, in load order.
	pub fn loaded_tables(&self) -> impl Iterator<Item = &str> {
		self.loaded.keys().map(String::as_str)
	}

	/// The driver.
	pub fn driver(&self) -> &D {
		&self.driver
	}

	/// Mutable access to the driver.
	pub fn driver_mut(&mut self) -> &mut D {
		&mut self.driver
	}

	/// The source.
	pub fn source(&self) -> &S {
		&self.source
	}

	/// Splits the harness into its driver and source.
	pub fn into_parts(self) -> (D, S) {
		(self.driver, self.source)
	}
}
