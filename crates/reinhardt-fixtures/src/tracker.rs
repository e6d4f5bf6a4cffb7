//! Truncation tracking.

use indexmap::IndexSet;

use crate::error::FixtureResult;
use crate::executor::{StatementExecutor, delete_all_sql, run};

/// Remembers every table a driver has written to, so they can be emptied later.
///
/// Tables are kept once each, in the order they were first touched.
#[derive(Debug, Clone, Default)]
pub struct TruncationTracker {
	tables: IndexSet<String>,
}

impl TruncationTracker {
	/// Creates an empty tracker.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records that `table` has received rows.
	pub fn touch(&mut self, table: &str) {
		if !self.tables.contains(table) {
			self.tables.insert(table.to_string());
		}
	}

	/// Tracked tables in first-touch order.
	pub fn tables(&self) -> impl Iterator<Item = &str> {
		self.tables.iter().map(String::as_str)
	}

	/// Returns true if `table` is tracked.
	pub fn contains(&self, table: &str) -> bool {
		self.tables.contains(table)
	}

	/// Number of tracked tables.
	pub fn len(&self) -> usize {
		self.tables.len()
	}

	/// Returns true if nothing is tracked.
	pub fn is_empty(&self) -> bool {
		self.tables.is_empty()
	}

	/// Deletes every row of every tracked table and forgets them.
	///
	/// Foreign key checks are switched off around the deletes so tables can be
	/// emptied in any order. Returns the number of tables emptied.
	///
	/// # Errors
	///
	/// The first failing statement is returned. Foreign key checks are turned
	/// back on and the tracked set is kept, so the call can be retried.
	pub fn truncate_all<E: StatementExecutor + ?Sized>(
		&mut self,
		executor: &mut E,
	) -> FixtureResult<usize> {
		if self.tables.is_empty() {
			tracing::debug!("No tables to truncate");
			return Ok(0);
		}

		executor.set_foreign_key_checks(false)?;
		let deleted = self
			.tables
			.iter()
			.try_for_each(|table| run(executor, &delete_all_sql(table), &[]).map(|_| ()));
		let restored = executor.set_foreign_key_checks(true);
		deleted?;
		restored?;

		let count = self.tables.len();
		tracing::info!(
			tables = count,
			"Truncated fixture tables: {}",
			self.tables.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
		);
		self.tables.clear();
		Ok(count)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::executor::RecordingExecutor;
	use rstest::rstest;

	#[rstest]
	fn test_touch_is_idempotent() {
		let mut tracker = TruncationTracker::new();
		tracker.touch("pirates");
		tracker.touch("parrots");
		tracker.touch("pirates");
		assert_eq!(tracker.tables().collect::<Vec<_>>(), ["pirates", "parrots"]);
		assert_eq!(tracker.len(), 2);
	}

	#[rstest]
	fn test_truncate_all_deletes_each_table_once() {
		let mut tracker = TruncationTracker::new();
		tracker.touch("pirates");
		tracker.touch("catchphrases_pirates");
		tracker.touch("pirates");

		let mut executor = RecordingExecutor::new();
		let count = tracker.truncate_all(&mut executor).unwrap();

		assert_eq!(count, 2);
		assert_eq!(
			executor.sql(),
			["DELETE FROM pirates", "DELETE FROM catchphrases_pirates"]
		);
		assert_eq!(executor.foreign_key_checks(), [false, true]);
		assert!(tracker.is_empty());
	}

	#[rstest]
	fn test_truncate_empty_is_noop() {
		let mut tracker = TruncationTracker::new();
		let mut executor = RecordingExecutor::new();
		assert_eq!(tracker.truncate_all(&mut executor).unwrap(), 0);
		assert!(executor.statements().is_empty());
		assert!(executor.foreign_key_checks().is_empty());
	}

	#[rstest]
	fn test_failed_truncate_keeps_tables() {
		let mut tracker = TruncationTracker::new();
		tracker.touch("pirates");
		tracker.touch("boats");

		let mut executor = RecordingExecutor::new().failing_on("boats");
		assert!(tracker.truncate_all(&mut executor).is_err());
		assert_eq!(executor.foreign_key_checks(), [false, true]);
		assert!(tracker.contains("boats"));
		assert_eq!(tracker.len(), 2);
	}
}
