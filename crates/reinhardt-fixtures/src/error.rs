//! Error types for fixture loading.
//!
//! This module defines the error types used throughout the reinhardt-fixtures crate.

use thiserror::Error;

use crate::relations::RelationKind;

/// Errors that can occur while building, persisting or truncating fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
	/// A table name could not be mapped to a registered model.
	#[error("Can't resolve a model for {table} (looked for {candidate})")]
	ModelResolution {
		/// Table the fixtures were loaded for.
		table: String,
		/// Fully qualified model name that was looked up.
		candidate: String,
	},

	/// A HasOne or HasMany relation was used as a settable fixture relation.
	#[error("Can't set a {kind} relation on {table} set a BelongsTo relation on {other_table} instead.")]
	InvalidRelationDirection {
		/// Relation kind found on the fixture.
		kind: RelationKind,
		/// Table of the record carrying the fixture.
		table: String,
		/// Table owning the foreign key.
		other_table: String,
	},

	/// The statement executor failed.
	#[error("Statement failed: {message} (sql: {sql})")]
	StatementExecution {
		/// SQL text that was executed.
		sql: String,
		/// Error reported by the executor.
		message: String,
	},

	/// A column value has a shape that cannot be stored or resolved.
	#[error("Invalid value for {table}.{label}.{column}: {message}")]
	InvalidValue {
		/// Table of the fixture.
		table: String,
		/// Label of the fixture.
		label: String,
		/// Column carrying the value.
		column: String,
		/// What was wrong with it.
		message: String,
	},

	/// Settings or driver setup is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),

	/// No fixture set exists for the table.
	#[error("No fixtures found for table: {0}")]
	FixtureNotFound(String),

	/// Fixture file not found.
	#[error("Fixture file not found: {0}")]
	FileNotFound(String),

	/// Unsupported file extension.
	#[error("Unsupported file extension: {0}")]
	UnsupportedExtension(String),

	/// Error parsing fixture data.
	#[error("Parse error: {0}")]
	ParseError(String),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	/// YAML deserialization error (when yaml feature is enabled).
	#[cfg(feature = "yaml")]
	#[error("YAML error: {0}")]
	YamlError(#[from] serde_yaml::Error),

	/// TOML deserialization error.
	#[error("TOML error: {0}")]
	TomlError(#[from] toml::de::Error),
}

impl FixtureError {
	/// Builds an [`FixtureError::InvalidValue`] for a column of a fixture.
	pub fn invalid_value(
		table: impl Into<String>,
		label: impl Into<String>,
		column: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self::InvalidValue {
			table: table.into(),
			label: label.into(),
			column: column.into(),
			message: message.into(),
		}
	}

	/// Builds a [`FixtureError::StatementExecution`] from any displayable executor error.
	pub fn statement(sql: impl Into<String>, error: impl std::fmt::Display) -> Self {
		Self::StatementExecution {
			sql: sql.into(),
			message: error.to_string(),
		}
	}
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;
