//! Schema-free driver.
//!
//! Builds records from table and column names only and writes one INSERT per
//! record, using that record's own columns. Columns matching the
//! [`ForeignKeyConvention`] have label values replaced by generated keys.
//! Relations are only resolved where they are declared with
//! [`StandardDriver::with_relation`].

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{BuiltRecords, FixtureDriver};
use crate::builder::{ColumnStyle, RecordBuilder};
use crate::error::FixtureResult;
use crate::executor::{StatementExecutor, insert_row};
use crate::keys::{Crc32KeyGenerator, KeyGenerator};
use crate::naming::{ForeignKeyConvention, SuffixConvention};
use crate::relations::{NoRelations, RelationDescriptor, RelationLookup};
use crate::tracker::TruncationTracker;
use crate::value::FixtureSet;

/// Loads fixtures straight into tables.
///
/// # Example
///
/// ```
/// use reinhardt_fixtures::drivers::{FixtureDriver, StandardDriver};
/// use reinhardt_fixtures::executor::RecordingExecutor;
/// use reinhardt_fixtures::{columns, fixture_set};
///
/// let mut driver = StandardDriver::new(RecordingExecutor::new());
/// let parrots = fixture_set! {
///     "george" => columns! { "name" => "George", "pirate_id" => "blackbeard" },
/// };
///
/// let records = driver.build_records("parrots", &parrots).unwrap();
/// assert_eq!(records["george"].get_i64("id"), Some(380982691));
/// assert_eq!(records["george"].get_i64("pirate_id"), Some(959118195));
/// assert_eq!(
///     driver.executor().sql(),
///     ["INSERT INTO parrots (id, name, pirate_id) VALUES (?, ?, ?)"]
/// );
/// ```
#[derive(Debug)]
pub struct StandardDriver<E> {
	executor: E,
	keys: Arc<dyn KeyGenerator>,
	foreign_keys: Arc<dyn ForeignKeyConvention>,
	relations: HashMap<String, IndexMap<String, RelationDescriptor>>,
	tracker: TruncationTracker,
}

impl<E: StatementExecutor> StandardDriver<E> {
	/// Creates a driver with CRC32 keys and the `_id` foreign key suffix.
	pub fn new(executor: E) -> Self {
		Self {
			executor,
			keys: Arc::new(Crc32KeyGenerator::new()),
			foreign_keys: Arc::new(SuffixConvention::default()),
			relations: HashMap::new(),
			tracker: TruncationTracker::new(),
		}
	}

	/// Replaces the key generation strategy.
	pub fn with_key_generator(mut self, keys: impl Into<Arc<dyn KeyGenerator>>) -> Self {
		self.keys = keys.into();
		self
	}

	/// Replaces the foreign key column convention.
	pub fn with_foreign_key_convention(
		mut self,
		convention: impl ForeignKeyConvention + 'static,
	) -> Self {
		self.foreign_keys = Arc::new(convention);
		self
	}

	/// Declares a relation for `column` of `table`.
	///
	/// The column is then resolved instead of assigned. BelongsToMany join rows
	/// are inserted after the owning record.
	pub fn with_relation(
		mut self,
		table: impl Into<String>,
		column: impl Into<String>,
		descriptor: RelationDescriptor,
	) -> Self {
		self.relations
			.entry(table.into())
			.or_default()
			.insert(column.into(), descriptor);
		self
	}

	/// The executor.
	pub fn executor(&self) -> &E {
		&self.executor
	}

	/// Mutable access to the executor.
	pub fn executor_mut(&mut self) -> &mut E {
		&mut self.executor
	}

	/// Gives the executor back.
	pub fn into_executor(self) -> E {
		self.executor
	}
}

impl<E: StatementExecutor> FixtureDriver for StandardDriver<E> {
	fn build_records(&mut self, table: &str, fixtures: &FixtureSet) -> FixtureResult<BuiltRecords> {
		self.tracker.touch(table);
		if fixtures.is_empty() {
			tracing::warn!(table, "Fixture set is empty");
			return Ok(BuiltRecords::new());
		}

		let builder = RecordBuilder::new(
			table,
			Arc::clone(&self.keys),
			ColumnStyle::SchemaFree(Arc::clone(&self.foreign_keys)),
		);
		let relations: &dyn RelationLookup = match self.relations.get(table) {
			Some(declared) => declared,
			None => &NoRelations,
		};

		let mut records = BuiltRecords::with_capacity(fixtures.len());
		for (label, columns) in fixtures {
			let record = builder.build(label, columns, relations)?;
			for link in record.join_links() {
				self.tracker.touch(link.table());
			}
			records.insert(label.clone(), record);
		}

		for record in records.values() {
			insert_row(&mut self.executor, table, record.columns())?;
			for row in record.join_rows() {
				insert_row(&mut self.executor, row.table(), row.columns())?;
			}
		}

		tracing::info!(table, records = records.len(), "Loaded fixtures");
		Ok(records)
	}

	fn truncate(&mut self) -> FixtureResult<usize> {
		self.tracker.truncate_all(&mut self.executor)
	}

	fn tracker(&self) -> &TruncationTracker {
		&self.tracker
	}
}
