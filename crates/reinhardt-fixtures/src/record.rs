//! Built records and join rows.

use indexmap::IndexMap;

use crate::value::SqlValue;

/// One row built from a fixture, addressable by its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	table: String,
	label: String,
	primary_key: String,
	columns: IndexMap<String, SqlValue>,
	// attribute -> database column, only where the two differ
	column_names: IndexMap<String, String>,
	join_links: Vec<JoinLink>,
	join_rows: Vec<JoinRow>,
}

impl Record {
	/// Creates an empty record for `table` whose primary key column is `primary_key`.
	pub fn new(
		table: impl Into<String>,
		label: impl Into<String>,
		primary_key: impl Into<String>,
	) -> Self {
		Self {
			table: table.into(),
			label: label.into(),
			primary_key: primary_key.into(),
			columns: IndexMap::new(),
			column_names: IndexMap::new(),
			join_links: Vec::new(),
			join_rows: Vec::new(),
		}
	}

	/// Table the record belongs to.
	pub fn table(&self) -> &str {
		&self.table
	}

	/// Fixture label of the record.
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Name of the primary key column.
	pub fn primary_key(&self) -> &str {
		&self.primary_key
	}

	/// Value of the primary key column.
	pub fn key(&self) -> Option<&SqlValue> {
		self.columns.get(&self.primary_key)
	}

	/// Returns a column value.
	pub fn get(&self, column: &str) -> Option<&SqlValue> {
		self.columns.get(column)
	}

	/// Returns a column value as an integer.
	pub fn get_i64(&self, column: &str) -> Option<i64> {
		self.get(column).and_then(SqlValue::as_i64)
	}

	/// Returns a column value as text.
	pub fn get_str(&self, column: &str) -> Option<&str> {
		self.get(column).and_then(SqlValue::as_str)
	}

	/// Returns true if the column is set, even to NULL.
	pub fn contains(&self, column: &str) -> bool {
		self.columns.contains_key(column)
	}

	/// Sets a column, keeping its original position if it was already set.
	pub fn set(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
		self.columns.insert(column.into(), value.into());
	}

	/// Sets an attribute that is stored under a different database column.
	pub fn set_mapped(
		&mut self,
		attribute: impl Into<String>,
		column: impl Into<String>,
		value: impl Into<SqlValue>,
	) {
		let attribute = attribute.into();
		let column = column.into();
		if column == attribute {
			self.column_names.shift_remove(&attribute);
		} else {
			self.column_names.insert(attribute.clone(), column);
		}
		self.columns.insert(attribute, value.into());
	}

	/// Database column an attribute is stored under.
	pub fn column_name<'a>(&'a self, attribute: &'a str) -> &'a str {
		self.column_names
			.get(attribute)
			.map_or(attribute, String::as_str)
	}

	/// Columns in assignment order, keyed by attribute name.
	pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
		self.columns.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Columns in assignment order, keyed by database column name.
	pub fn stored_columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
		self.columns
			.iter()
			.map(|(k, v)| (self.column_name(k), v))
	}

	/// Number of columns set.
	pub fn len(&self) -> usize {
		self.columns.len()
	}

	/// Returns true if no column is set.
	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}

	/// Join rows produced by many-to-many references on this record.
	pub fn join_rows(&self) -> &[JoinRow] {
		&self.join_rows
	}

	/// Join tables this record links through, including ones given no targets.
	pub fn join_links(&self) -> &[JoinLink] {
		&self.join_links
	}

	pub(crate) fn push_join_rows(&mut self, link: JoinLink, rows: impl IntoIterator<Item = JoinRow>) {
		if !self.join_links.contains(&link) {
			self.join_links.push(link);
		}
		self.join_rows.extend(rows);
	}
}

/// The owner side of a many-to-many relation: join table, owner column and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLink {
	table: String,
	owner_column: String,
	owner_key: i64,
}

impl JoinLink {
	/// Creates a link.
	pub fn new(table: impl Into<String>, owner_column: impl Into<String>, owner_key: i64) -> Self {
		Self {
			table: table.into(),
			owner_column: owner_column.into(),
			owner_key,
		}
	}

	/// Join table name.
	pub fn table(&self) -> &str {
		&self.table
	}

	/// Column holding the owning record's key.
	pub fn owner_column(&self) -> &str {
		&self.owner_column
	}

	/// Owning record's key.
	pub fn owner_key(&self) -> i64 {
		self.owner_key
	}
}

/// A row of a many-to-many join table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRow {
	table: String,
	owner_column: String,
	columns: IndexMap<String, SqlValue>,
}

impl JoinRow {
	/// Creates a join row with the owner and target foreign keys set.
	pub fn new(
		table: impl Into<String>,
		owner_column: impl Into<String>,
		owner_key: i64,
		target_column: impl Into<String>,
		target_key: i64,
	) -> Self {
		let owner_column = owner_column.into();
		let mut columns = IndexMap::new();
		columns.insert(owner_column.clone(), SqlValue::Int(owner_key));
		columns.insert(target_column.into(), SqlValue::Int(target_key));
		Self {
			table: table.into(),
			owner_column,
			columns,
		}
	}

	/// Adds an extra pivot column.
	pub fn with_attribute(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
		self.columns.insert(column.into(), value.into());
		self
	}

	/// Join table name.
	pub fn table(&self) -> &str {
		&self.table
	}

	/// Column holding the owning record's key.
	pub fn owner_column(&self) -> &str {
		&self.owner_column
	}

	/// Owning record's key.
	pub fn owner_key(&self) -> Option<&SqlValue> {
		self.columns.get(&self.owner_column)
	}

	/// Returns a column value.
	pub fn get(&self, column: &str) -> Option<&SqlValue> {
		self.columns.get(column)
	}

	/// Columns in order: owner key, target key, then pivot attributes.
	pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
		self.columns.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Number of columns.
	pub fn len(&self) -> usize {
		self.columns.len()
	}

	/// Always false; a join row carries at least its two keys.
	pub fn is_empty(&self) -> bool {
		self.columns.is_empty()
	}
}
