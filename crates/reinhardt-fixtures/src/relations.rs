//! Relation descriptors and their resolution.
//!
//! A fixture column that names a relation is not assigned directly. The
//! [`RelationResolver`] turns its value into either a foreign key on the
//! record ([`RelationDescriptor::BelongsTo`]) or join-table rows
//! ([`RelationDescriptor::BelongsToMany`]). HasOne and HasMany relations keep
//! their foreign key on the other table and are always rejected.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{FixtureError, FixtureResult};
use crate::keys::KeyGenerator;
use crate::naming::{foreign_key_for_table, singularize};
use crate::record::{JoinLink, JoinRow, Record};
use crate::value::{FixtureValue, PivotAttributes, SqlValue};

/// Kind of a relation, without its column metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
	/// Foreign key on this record.
	BelongsTo,
	/// Join table.
	BelongsToMany,
	/// Foreign key on the other record, at most one.
	HasOne,
	/// Foreign key on the other records.
	HasMany,
}

impl fmt::Display for RelationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::BelongsTo => write!(f, "BelongsTo"),
			Self::BelongsToMany => write!(f, "BelongsToMany"),
			Self::HasOne => write!(f, "HasOne"),
			Self::HasMany => write!(f, "HasMany"),
		}
	}
}

/// A declared relation, with the columns needed to populate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationDescriptor {
	/// This record stores the related record's key in `foreign_key`.
	BelongsTo {
		/// Column on this table.
		foreign_key: String,
	},
	/// Records are linked through rows of `join_table`.
	BelongsToMany {
		/// Join table name.
		join_table: String,
		/// Join table column holding this record's key.
		foreign_pivot_key: String,
		/// Join table column holding the related record's key.
		related_pivot_key: String,
	},
	/// `related_table.foreign_key` points at this record, at most once.
	HasOne {
		/// Table owning the foreign key.
		related_table: String,
		/// Column on the related table.
		foreign_key: String,
	},
	/// `related_table.foreign_key` points at this record.
	HasMany {
		/// Table owning the foreign key.
		related_table: String,
		/// Column on the related table.
		foreign_key: String,
	},
}

impl RelationDescriptor {
	/// BelongsTo with an explicit foreign key column.
	pub fn belongs_to(foreign_key: impl Into<String>) -> Self {
		Self::BelongsTo {
			foreign_key: foreign_key.into(),
		}
	}

	/// BelongsTo a `related_table` through its conventional foreign key ("pirates" -> "pirate_id").
	pub fn belongs_to_table(related_table: &str) -> Self {
		Self::belongs_to(foreign_key_for_table(related_table))
	}

	/// BelongsToMany with explicit join table and key columns.
	pub fn belongs_to_many(
		join_table: impl Into<String>,
		foreign_pivot_key: impl Into<String>,
		related_pivot_key: impl Into<String>,
	) -> Self {
		Self::BelongsToMany {
			join_table: join_table.into(),
			foreign_pivot_key: foreign_pivot_key.into(),
			related_pivot_key: related_pivot_key.into(),
		}
	}

	/// BelongsToMany between two tables with conventional names.
	///
	/// The join table joins both singular names in alphabetical order.
	///
	/// ```
	/// use reinhardt_fixtures::relations::RelationDescriptor;
	///
	/// assert_eq!(
	///     RelationDescriptor::many_to_many("pirates", "catchphrases"),
	///     RelationDescriptor::belongs_to_many("catchphrase_pirate", "pirate_id", "catchphrase_id"),
	/// );
	/// ```
	pub fn many_to_many(table: &str, related_table: &str) -> Self {
		let mut names = [singularize(table), singularize(related_table)];
		names.sort();
		Self::belongs_to_many(
			names.join("_"),
			foreign_key_for_table(table),
			foreign_key_for_table(related_table),
		)
	}

	/// HasOne: `related_table` holds the conventional foreign key to `table`.
	pub fn has_one(table: &str, related_table: impl Into<String>) -> Self {
		Self::HasOne {
			related_table: related_table.into(),
			foreign_key: foreign_key_for_table(table),
		}
	}

	/// HasMany: `related_table` holds the conventional foreign key to `table`.
	pub fn has_many(table: &str, related_table: impl Into<String>) -> Self {
		Self::HasMany {
			related_table: related_table.into(),
			foreign_key: foreign_key_for_table(table),
		}
	}

	/// The kind of this relation.
	pub fn kind(&self) -> RelationKind {
		match self {
			Self::BelongsTo { .. } => RelationKind::BelongsTo,
			Self::BelongsToMany { .. } => RelationKind::BelongsToMany,
			Self::HasOne { .. } => RelationKind::HasOne,
			Self::HasMany { .. } => RelationKind::HasMany,
		}
	}
}

/// Looks up the relation declared for a column or attribute.
pub trait RelationLookup {
	/// Returns the relation declared under `name`, if any.
	fn relation(&self, name: &str) -> Option<&RelationDescriptor>;
}

/// A lookup that never finds a relation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelations;

impl RelationLookup for NoRelations {
	fn relation(&self, _name: &str) -> Option<&RelationDescriptor> {
		None
	}
}

impl RelationLookup for IndexMap<String, RelationDescriptor> {
	fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
		self.get(name)
	}
}

/// Result of resolving one relation-shaped column.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationOutcome {
	/// Set `column` on the record to `key`.
	ForeignKey {
		/// Foreign key column.
		column: String,
		/// Generated key of the target label.
		key: i64,
	},
	/// Join rows to persist, in target order.
	JoinRows {
		/// Join table and owner column; present even when there are no rows.
		link: JoinLink,
		/// One row per target.
		rows: Vec<JoinRow>,
	},
}

/// Resolves relation-shaped fixture values into keys and join rows.
#[derive(Debug, Clone)]
pub struct RelationResolver {
	keys: Arc<dyn KeyGenerator>,
}

impl RelationResolver {
	/// Creates a resolver using `keys` for every target label.
	pub fn new(keys: Arc<dyn KeyGenerator>) -> Self {
		Self { keys }
	}

	/// Resolves `value` for `column` of `record` against `descriptor`.
	///
	/// # Errors
	///
	/// - [`FixtureError::InvalidRelationDirection`] for HasOne and HasMany
	/// - [`FixtureError::InvalidValue`] when the value does not fit the relation
	pub fn resolve(
		&self,
		record: &Record,
		column: &str,
		descriptor: &RelationDescriptor,
		value: &FixtureValue,
	) -> FixtureResult<RelationOutcome> {
		match descriptor {
			RelationDescriptor::BelongsTo { foreign_key } => {
				let target = match value {
					FixtureValue::Scalar(SqlValue::Text(label)) => label,
					other => {
						return Err(FixtureError::invalid_value(
							record.table(),
							record.label(),
							column,
							format!("a BelongsTo reference must be a label, found {}", other.kind()),
						));
					}
				};
				Ok(RelationOutcome::ForeignKey {
					column: foreign_key.clone(),
					key: self.keys.generate_key(target),
				})
			}
			RelationDescriptor::BelongsToMany {
				join_table,
				foreign_pivot_key,
				related_pivot_key,
			} => {
				let targets = self.targets(record, column, value)?;
				let owner_key = self.owner_key(record);
				let rows = targets
					.into_iter()
					.map(|(label, attributes)| {
						attributes.into_iter().fold(
							JoinRow::new(
								join_table.as_str(),
								foreign_pivot_key.as_str(),
								owner_key,
								related_pivot_key.as_str(),
								self.keys.generate_key(&label),
							),
							|row, (attribute, value)| row.with_attribute(attribute, value),
						)
					})
					.collect();
				Ok(RelationOutcome::JoinRows {
					link: JoinLink::new(join_table.as_str(), foreign_pivot_key.as_str(), owner_key),
					rows,
				})
			}
			RelationDescriptor::HasOne { related_table, .. }
			| RelationDescriptor::HasMany { related_table, .. } => {
				Err(FixtureError::InvalidRelationDirection {
					kind: descriptor.kind(),
					table: record.table().to_string(),
					other_table: related_table.clone(),
				})
			}
		}
	}

	/// Key stored in join rows for the owning record.
	///
	/// An explicit integer primary key (or integer text) wins; otherwise the
	/// label's generated key.
	fn owner_key(&self, record: &Record) -> i64 {
		record
			.key()
			.and_then(SqlValue::as_integer)
			.unwrap_or_else(|| self.keys.generate_key(record.label()))
	}

	/// Normalizes the accepted many-to-many value shapes into (label, attributes) pairs.
	fn targets(
		&self,
		record: &Record,
		column: &str,
		value: &FixtureValue,
	) -> FixtureResult<Vec<(String, PivotAttributes)>> {
		match value {
			FixtureValue::List(labels) => Ok(labels
				.iter()
				.map(|label| (label.clone(), PivotAttributes::new()))
				.collect()),
			FixtureValue::Pivot(targets) => Ok(targets
				.iter()
				.map(|(label, attributes)| (label.clone(), attributes.clone()))
				.collect()),
			FixtureValue::Scalar(SqlValue::Text(specs)) => parse_pivot_specs(specs)
				.map_err(|message| {
					FixtureError::invalid_value(record.table(), record.label(), column, message)
				}),
			other => Err(FixtureError::invalid_value(
				record.table(),
				record.label(),
				column,
				format!(
					"a BelongsToMany reference must be labels or a spec string, found {}",
					other.kind()
				),
			)),
		}
	}
}

/// Parses `label|column:value|...` specs separated by commas.
///
/// ```
/// use reinhardt_fixtures::relations::parse_pivot_specs;
/// use reinhardt_fixtures::value::SqlValue;
///
/// let targets = parse_pivot_specs("batten|position:5, fishes").unwrap();
/// assert_eq!(targets[0].0, "batten");
/// assert_eq!(targets[0].1["position"], SqlValue::Int(5));
/// assert_eq!(targets[1].0, "fishes");
/// assert!(targets[1].1.is_empty());
/// ```
pub fn parse_pivot_specs(specs: &str) -> Result<Vec<(String, PivotAttributes)>, String> {
	let mut targets = Vec::new();

	for spec in specs.split(',') {
		let spec = spec.trim();
		if spec.is_empty() {
			tracing::warn!(specs, "Skipping empty relation target");
			continue;
		}

		let mut parts = spec.split('|');
		let label = parts.next().unwrap_or_default().trim();
		if label.is_empty() {
			return Err(format!("relation target '{}' has no label", spec));
		}

		let mut attributes = PivotAttributes::new();
		for part in parts {
			let (column, value) = part
				.split_once(':')
				.ok_or_else(|| format!("pivot attribute '{}' must be written column:value", part))?;
			let column = column.trim();
			if column.is_empty() {
				return Err(format!("pivot attribute '{}' has no column", part));
			}
			attributes.insert(column.to_string(), SqlValue::parse_inline(value));
		}

		targets.push((label.to_string(), attributes));
	}

	Ok(targets)
}
