//! The pirate test domain.
//!
//! Pirates have catchphrases through a join table with a `position` pivot
//! column, parrots belong to pirates, and crew members belong to boats.

use reinhardt_fixtures::drivers::{ModelMetadata, ModelRegistry};
use reinhardt_fixtures::naming::AttributeCase;
use rusqlite::Connection;

/// Namespace the test models are registered in.
pub const NAMESPACE: &str = "tests::models";

const SCHEMA: &str = "
	PRAGMA foreign_keys = ON;
	CREATE TABLE pirates (
		id INTEGER PRIMARY KEY,
		name TEXT,
		title TEXT,
		created_at TEXT,
		updated_at TEXT
	);
	CREATE TABLE catchphrases (
		id INTEGER PRIMARY KEY,
		phrase TEXT
	);
	CREATE TABLE catchphrase_pirate (
		pirate_id INTEGER NOT NULL REFERENCES pirates (id),
		catchphrase_id INTEGER NOT NULL REFERENCES catchphrases (id),
		position INTEGER
	);
	CREATE TABLE parrots (
		id INTEGER PRIMARY KEY,
		name TEXT,
		pirate_id INTEGER REFERENCES pirates (id)
	);
	CREATE TABLE boats (
		id INTEGER PRIMARY KEY,
		name TEXT
	);
	CREATE TABLE crew (
		id INTEGER PRIMARY KEY,
		name TEXT,
		boat_id INTEGER REFERENCES boats (id)
	);
";

/// In-memory database with the pirate schema and foreign keys enforced.
pub fn connection() -> Connection {
	let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
	conn.execute_batch(SCHEMA).expect("Failed to create schema");
	conn
}

/// Number of rows in `table`.
pub fn count(conn: &Connection, table: &str) -> i64 {
	conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
		.expect("Failed to count rows")
}

/// Models of the pirate domain.
pub fn registry() -> ModelRegistry {
	ModelRegistry::new()
		.with_model(
			ModelMetadata::new("Pirate", "pirates")
				.in_namespace(NAMESPACE)
				.with_timestamps(true)
				.belongs_to_many("catchphrases", "catchphrases")
				.has_one("parrot", "parrots"),
		)
		.with_model(ModelMetadata::new("Catchphrase", "catchphrases").in_namespace(NAMESPACE))
		.with_model(
			ModelMetadata::new("Parrot", "parrots")
				.in_namespace(NAMESPACE)
				.belongs_to("pirate", "pirates"),
		)
		.with_model(
			ModelMetadata::new("Boat", "boats")
				.in_namespace(NAMESPACE)
				.has_many("crew", "crew"),
		)
		.with_model(
			ModelMetadata::new("Crew", "crew")
				.in_namespace(NAMESPACE)
				.with_attribute_case(AttributeCase::CamelCase)
				.belongs_to("boat", "boats"),
		)
}
