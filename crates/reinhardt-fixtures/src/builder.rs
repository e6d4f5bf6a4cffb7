//! Record building.
//!
//! [`RecordBuilder`] turns one fixture (label + column map) into a [`Record`]:
//!
//! 1. the primary key is set from the label unless the fixture supplies one,
//! 2. columns are visited in declaration order, computed values are evaluated
//!    against the partially built record,
//! 3. relation-shaped columns are handed to the [`RelationResolver`],
//! 4. everything else is assigned, with schema-free foreign key columns hashed
//!    and model columns renamed to the model's attribute names.

use std::sync::Arc;

use crate::error::{FixtureError, FixtureResult};
use crate::keys::KeyGenerator;
use crate::naming::{AttributeCase, ForeignKeyConvention};
use crate::record::Record;
use crate::relations::{RelationLookup, RelationOutcome, RelationResolver};
use crate::value::{ColumnMap, ComputeContext, FixtureValue, SqlValue};

/// Computed values may return further computed values; this bounds the chain.
const MAX_COMPUTE_DEPTH: usize = 16;

/// How columns are named and assigned.
#[derive(Debug, Clone)]
pub enum ColumnStyle {
	/// Table/column names only. Foreign key columns are found by convention.
	SchemaFree(Arc<dyn ForeignKeyConvention>),
	/// Model attributes. Columns are renamed to attributes before assignment.
	Model(AttributeCase),
}

/// Builds records for one table.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
	table: String,
	primary_key: String,
	keys: Arc<dyn KeyGenerator>,
	resolver: RelationResolver,
	style: ColumnStyle,
}

impl RecordBuilder {
	/// Creates a builder for `table`.
	pub fn new(table: impl Into<String>, keys: Arc<dyn KeyGenerator>, style: ColumnStyle) -> Self {
		Self {
			table: table.into(),
			primary_key: "id".to_string(),
			resolver: RelationResolver::new(Arc::clone(&keys)),
			keys,
			style,
		}
	}

	/// Sets the primary key column (or attribute, for models). Defaults to `id`.
	pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
		self.primary_key = primary_key.into();
		self
	}

	/// Primary key column used for new records.
	pub fn primary_key(&self) -> &str {
		&self.primary_key
	}

	/// Builds the record for `label`.
	///
	/// # Errors
	///
	/// Relation errors from the [`RelationResolver`] are returned unchanged.
	/// Non-scalar values on columns that are not relations are rejected with
	/// [`FixtureError::InvalidValue`].
	pub fn build(
		&self,
		label: &str,
		columns: &ColumnMap,
		relations: &dyn RelationLookup,
	) -> FixtureResult<Record> {
		let mut record = Record::new(self.table.as_str(), label, self.primary_key.as_str());
		let generated_key = self.keys.generate_key(label);

		if !self.supplies_primary_key(columns) {
			record.set(self.primary_key.as_str(), generated_key);
		}

		for (column, raw) in columns {
			let value = self.evaluate(&record, column, raw, columns)?;
			let name = match &self.style {
				ColumnStyle::SchemaFree(_) => column.clone(),
				ColumnStyle::Model(case) => case.attribute(column),
			};

			if let Some(descriptor) = relations.relation(&name) {
				match self.resolver.resolve(&record, column, descriptor, &value)? {
					RelationOutcome::ForeignKey { column, key } => record.set(column, key),
					RelationOutcome::JoinRows { link, rows } => record.push_join_rows(link, rows),
				}
				continue;
			}

			let kind = value.kind();
			let FixtureValue::Scalar(scalar) = value else {
				return Err(FixtureError::invalid_value(
					self.table.as_str(),
					label,
					column.as_str(),
					format!("{} is only valid on a declared relation", kind),
				));
			};

			match &self.style {
				ColumnStyle::SchemaFree(foreign_keys) if foreign_keys.is_foreign_key(column) => {
					record.set(name, self.foreign_key_value(scalar))
				}
				ColumnStyle::SchemaFree(_) => record.set(name, scalar),
				ColumnStyle::Model(_) => record.set_mapped(name, column.as_str(), scalar),
			}
		}

		// A computed primary key may have produced NULL
		if record.key().is_none_or(SqlValue::is_null) {
			record.set(self.primary_key.as_str(), generated_key);
		}

		tracing::debug!(
			table = %self.table,
			label,
			key = %record.key().map(ToString::to_string).unwrap_or_default(),
			"Built fixture record"
		);

		Ok(record)
	}

	/// True if the fixture sets a non-null literal primary key.
	fn supplies_primary_key(&self, columns: &ColumnMap) -> bool {
		columns.iter().any(|(column, value)| {
			let name = match &self.style {
				ColumnStyle::SchemaFree(_) => column.clone(),
				ColumnStyle::Model(case) => case.attribute(column),
			};
			name == self.primary_key && value.as_scalar().is_some_and(|v| !v.is_null())
		})
	}

	/// Evaluates computed values until a literal is produced.
	fn evaluate(
		&self,
		record: &Record,
		column: &str,
		raw: &FixtureValue,
		columns: &ColumnMap,
	) -> FixtureResult<FixtureValue> {
		let context = ComputeContext {
			record,
			columns: match self.style {
				ColumnStyle::SchemaFree(_) => Some(columns),
				ColumnStyle::Model(_) => None,
			},
		};

		let mut value = raw.clone();
		for _ in 0..=MAX_COMPUTE_DEPTH {
			match value {
				FixtureValue::Computed(computed) => value = computed.evaluate(&context),
				literal => return Ok(literal),
			}
		}

		Err(FixtureError::invalid_value(
			self.table.as_str(),
			record.label(),
			column,
			"computed value did not produce a literal",
		))
	}

	/// Hashes a label stored in a foreign key column. Numbers and NULL pass through.
	fn foreign_key_value(&self, value: SqlValue) -> SqlValue {
		match value {
			SqlValue::Text(ref label) if !value.is_numeric() => {
				SqlValue::Int(self.keys.generate_key(label))
			}
			other => other,
		}
	}
}
