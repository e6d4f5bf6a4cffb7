//! Statement execution.
//!
//! Drivers never talk to a database directly. They hand parameterized SQL to a
//! [`StatementExecutor`], which lets the same driver run against SQLite, a
//! caller-provided connection, or the in-memory [`RecordingExecutor`].

use crate::error::FixtureResult;
use crate::value::SqlValue;

/// Executes parameterized statements.
///
/// Placeholders are positional `?` markers, one per parameter.
pub trait StatementExecutor {
	/// Executes `sql` with `params` and returns the number of affected rows.
	fn execute(&mut self, sql: &str, params: &[SqlValue]) -> FixtureResult<u64>;

	/// Turns foreign key enforcement on or off.
	///
	/// Executors without such a switch keep the default no-op.
	fn set_foreign_key_checks(&mut self, enabled: bool) -> FixtureResult<()> {
		let _ = enabled;
		Ok(())
	}
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for &mut E {
	fn execute(&mut self, sql: &str, params: &[SqlValue]) -> FixtureResult<u64> {
		(**self).execute(sql, params)
	}

	fn set_foreign_key_checks(&mut self, enabled: bool) -> FixtureResult<()> {
		(**self).set_foreign_key_checks(enabled)
	}
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for Box<E> {
	fn execute(&mut self, sql: &str, params: &[SqlValue]) -> FixtureResult<u64> {
		(**self).execute(sql, params)
	}

	fn set_foreign_key_checks(&mut self, enabled: bool) -> FixtureResult<()> {
		(**self).set_foreign_key_checks(enabled)
	}
}

/// `INSERT INTO table (a, b) VALUES (?, ?)` for the given columns.
///
/// ```
/// use reinhardt_fixtures::executor::insert_sql;
///
/// assert_eq!(
///     insert_sql("parrots", ["id", "name"]),
///     "INSERT INTO parrots (id, name) VALUES (?, ?)"
/// );
/// ```
pub fn insert_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
	let columns: Vec<&str> = columns.into_iter().collect();
	let placeholders = vec!["?"; columns.len()].join(", ");
	format!(
		"INSERT INTO {} ({}) VALUES ({})",
		table,
		columns.join(", "),
		placeholders
	)
}

/// `DELETE FROM table`.
pub fn delete_all_sql(table: &str) -> String {
	format!("DELETE FROM {}", table)
}

/// `DELETE FROM table WHERE column = ?`.
pub fn delete_where_sql(table: &str, column: &str) -> String {
	format!("DELETE FROM {} WHERE {} = ?", table, column)
}

/// Executes one statement, logging it first.
pub(crate) fn run<E: StatementExecutor + ?Sized>(
	executor: &mut E,
	sql: &str,
	params: &[SqlValue],
) -> FixtureResult<u64> {
	tracing::debug!(sql, params = params.len(), "Executing fixture statement");
	executor.execute(sql, params)
}

/// Inserts one row built from `(column, value)` pairs.
pub(crate) fn insert_row<'a, E, C>(
	executor: &mut E,
	table: &str,
	columns: impl IntoIterator<Item = (C, &'a SqlValue)>,
) -> FixtureResult<u64>
where
	E: StatementExecutor + ?Sized,
	C: AsRef<str>,
{
	let (names, params): (Vec<C>, Vec<SqlValue>) = columns
		.into_iter()
		.map(|(column, value)| (column, value.clone()))
		.unzip();
	let sql = insert_sql(table, names.iter().map(|name| name.as_ref()));
	run(executor, &sql, &params)
}

/// One statement seen by a [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
	/// SQL text.
	pub sql: String,
	/// Bound parameters.
	pub params: Vec<SqlValue>,
}

/// Executor that records statements instead of running them.
///
/// Useful for dry runs and for asserting on the exact statements a driver
/// produces.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
	statements: Vec<RecordedStatement>,
	foreign_key_checks: Vec<bool>,
	fail_on: Option<String>,
}

impl RecordingExecutor {
	/// Creates an empty recorder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes every statement whose SQL contains `fragment` fail.
	pub fn failing_on(mut self, fragment: impl Into<String>) -> Self {
		self.fail_on = Some(fragment.into());
		self
	}

	/// Statements recorded so far, in execution order.
	pub fn statements(&self) -> &[RecordedStatement] {
		&self.statements
	}

	/// SQL text of the recorded statements.
	pub fn sql(&self) -> Vec<&str> {
		self.statements.iter().map(|s| s.sql.as_str()).collect()
	}

	/// Every foreign key check toggle, in order.
	pub fn foreign_key_checks(&self) -> &[bool] {
		&self.foreign_key_checks
	}

	/// Forgets recorded statements and toggles.
	pub fn clear(&mut self) {
		self.statements.clear();
		self.foreign_key_checks.clear();
	}
}

impl StatementExecutor for RecordingExecutor {
	fn execute(&mut self, sql: &str, params: &[SqlValue]) -> FixtureResult<u64> {
		if self.fail_on.as_deref().is_some_and(|fragment| sql.contains(fragment)) {
			return Err(crate::error::FixtureError::statement(sql, "rejected by recorder"));
		}
		self.statements.push(RecordedStatement {
			sql: sql.to_string(),
			params: params.to_vec(),
		});
		Ok(1)
	}

	fn set_foreign_key_checks(&mut self, enabled: bool) -> FixtureResult<()> {
		self.foreign_key_checks.push(enabled);
		Ok(())
	}
}

#[cfg(feature = "sqlite")]
mod sqlite {
	use rusqlite::types::Value;

	use super::StatementExecutor;
	use crate::error::{FixtureError, FixtureResult};
	use crate::value::SqlValue;

	fn to_sqlite(value: &SqlValue) -> Value {
		match value {
			SqlValue::Null => Value::Null,
			SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
			SqlValue::Int(v) => Value::Integer(*v),
			SqlValue::Float(v) => Value::Real(*v),
			SqlValue::Text(s) => Value::Text(s.clone()),
			SqlValue::Timestamp(ts) => Value::Text(ts.to_rfc3339()),
		}
	}

	impl StatementExecutor for rusqlite::Connection {
		fn execute(&mut self, sql: &str, params: &[SqlValue]) -> FixtureResult<u64> {
			let affected = rusqlite::Connection::execute(
				self,
				sql,
				rusqlite::params_from_iter(params.iter().map(to_sqlite)),
			)
			.map_err(|e| FixtureError::statement(sql, e))?;
			Ok(affected as u64)
		}

		fn set_foreign_key_checks(&mut self, enabled: bool) -> FixtureResult<()> {
			let sql = format!("PRAGMA foreign_keys = {}", u8::from(enabled));
			self.execute_batch(&sql)
				.map_err(|e| FixtureError::statement(sql, e))
		}
	}
}
