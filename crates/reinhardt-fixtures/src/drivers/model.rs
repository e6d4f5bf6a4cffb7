//! Model-aware driver.
//!
//! Each table is mapped to a registered [`ModelMetadata`] by naming
//! convention: `pirates` in namespace `app::models` resolves
//! `app::models::Pirate`. The model's declared relations decide which fixture
//! columns are resolved, its attribute case decides how the rest are named,
//! and models with timestamps get `created_at` and `updated_at` filled in.
//!
//! Persisting a record is one INSERT for its own columns followed by a sync
//! of its many-to-many relations: the owner's existing join rows are deleted
//! and the new ones inserted, so loading the same fixtures twice leaves one
//! copy of each join row.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;

use super::{BuiltRecords, FixtureDriver};
use crate::builder::{ColumnStyle, RecordBuilder};
use crate::error::{FixtureError, FixtureResult};
use crate::executor::{StatementExecutor, delete_where_sql, insert_row, run};
use crate::keys::{Crc32KeyGenerator, KeyGenerator};
use crate::naming::{AttributeCase, model_name_for_table};
use crate::record::Record;
use crate::relations::{RelationDescriptor, RelationLookup};
use crate::tracker::TruncationTracker;
use crate::value::{FixtureSet, SqlValue};

/// Separator between a namespace and a model name.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Timestamp columns filled for models with timestamps.
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// What the model driver needs to know about a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
	name: String,
	namespace: String,
	table: String,
	primary_key: String,
	attribute_case: AttributeCase,
	timestamps: bool,
	relations: IndexMap<String, RelationDescriptor>,
}

impl ModelMetadata {
	/// Describes model `name` stored in `table`.
	pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			namespace: String::new(),
			table: table.into(),
			primary_key: "id".to_string(),
			attribute_case: AttributeCase::default(),
			timestamps: false,
			relations: IndexMap::new(),
		}
	}

	/// Places the model in a namespace.
	pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = namespace.into();
		self
	}

	/// Sets the primary key attribute. Defaults to `id`.
	pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
		self.primary_key = primary_key.into();
		self
	}

	/// Sets how attributes are named.
	pub fn with_attribute_case(mut self, case: AttributeCase) -> Self {
		self.attribute_case = case;
		self
	}

	/// Enables or disables automatic timestamps.
	pub fn with_timestamps(mut self, timestamps: bool) -> Self {
		self.timestamps = timestamps;
		self
	}

	/// Declares a relation under `attribute`.
	pub fn with_relation(mut self, attribute: impl Into<String>, descriptor: RelationDescriptor) -> Self {
		self.relations.insert(attribute.into(), descriptor);
		self
	}

	/// Declares a BelongsTo relation to `related_table` using its conventional foreign key.
	pub fn belongs_to(self, attribute: impl Into<String>, related_table: &str) -> Self {
		self.with_relation(attribute, RelationDescriptor::belongs_to_table(related_table))
	}

	/// Declares a BelongsToMany relation to `related_table` through the conventional join table.
	pub fn belongs_to_many(self, attribute: impl Into<String>, related_table: &str) -> Self {
		let descriptor = RelationDescriptor::many_to_many(&self.table, related_table);
		self.with_relation(attribute, descriptor)
	}

	/// Declares a HasOne relation to `related_table`.
	pub fn has_one(self, attribute: impl Into<String>, related_table: &str) -> Self {
		let descriptor = RelationDescriptor::has_one(&self.table, related_table);
		self.with_relation(attribute, descriptor)
	}

	/// Declares a HasMany relation to `related_table`.
	pub fn has_many(self, attribute: impl Into<String>, related_table: &str) -> Self {
		let descriptor = RelationDescriptor::has_many(&self.table, related_table);
		self.with_relation(attribute, descriptor)
	}

	/// Model name without namespace.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Namespace, empty for none.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Namespace and name, joined with [`NAMESPACE_SEPARATOR`].
	pub fn qualified_name(&self) -> String {
		qualify(&self.namespace, &self.name)
	}

	/// Table the model is stored in.
	pub fn table(&self) -> &str {
		&self.table
	}

	/// Primary key attribute.
	pub fn primary_key(&self) -> &str {
		&self.primary_key
	}

	/// Attribute naming.
	pub fn attribute_case(&self) -> AttributeCase {
		self.attribute_case
	}

	/// Whether timestamps are filled automatically.
	pub fn timestamps(&self) -> bool {
		self.timestamps
	}

	/// Declared relations by attribute.
	pub fn relations(&self) -> &IndexMap<String, RelationDescriptor> {
		&self.relations
	}
}

impl RelationLookup for ModelMetadata {
	fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
		self.relations.get(name)
	}
}

fn qualify(namespace: &str, name: &str) -> String {
	if namespace.is_empty() {
		name.to_string()
	} else {
		format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, name)
	}
}

/// Registered models, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
	models: HashMap<String, ModelMetadata>,
}

impl ModelRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a model, replacing any model with the same qualified name.
	pub fn register(&mut self, model: ModelMetadata) -> &mut Self {
		self.models.insert(model.qualified_name(), model);
		self
	}

	/// Registers a model, builder style.
	pub fn with_model(mut self, model: ModelMetadata) -> Self {
		self.register(model);
		self
	}

	/// Gets a model by qualified name.
	pub fn get(&self, qualified_name: &str) -> Option<&ModelMetadata> {
		self.models.get(qualified_name)
	}

	/// Checks if a model is registered under the qualified name.
	pub fn contains(&self, qualified_name: &str) -> bool {
		self.models.contains_key(qualified_name)
	}

	/// Returns all registered qualified names, sorted.
	pub fn model_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.models.keys().cloned().collect();
		names.sort();
		names
	}

	/// Returns the number of registered models.
	pub fn len(&self) -> usize {
		self.models.len()
	}

	/// Returns true if no models are registered.
	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}

	/// Finds the model for `table` in `namespace`.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::ModelResolution`] naming the qualified name that
	/// was looked up when no such model is registered.
	pub fn resolve(&self, namespace: &str, table: &str) -> FixtureResult<&ModelMetadata> {
		let candidate = qualify(namespace, &model_name_for_table(table));
		self.models
			.get(&candidate)
			.ok_or(FixtureError::ModelResolution {
				table: table.to_string(),
				candidate,
			})
	}
}

/// Loads fixtures through registered model metadata.
#[derive(Debug)]
pub struct ModelDriver<E> {
	executor: E,
	registry: ModelRegistry,
	namespace: String,
	keys: Arc<dyn KeyGenerator>,
	tracker: TruncationTracker,
}

impl<E: StatementExecutor> ModelDriver<E> {
	/// Creates a driver over `registry` with CRC32 keys and no namespace.
	pub fn new(executor: E, registry: ModelRegistry) -> Self {
		Self {
			executor,
			registry,
			namespace: String::new(),
			keys: Arc::new(Crc32KeyGenerator::new()),
			tracker: TruncationTracker::new(),
		}
	}

	/// Sets the namespace models are resolved in.
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = namespace.into();
		self
	}

	/// Replaces the key generation strategy.
	pub fn with_key_generator(mut self, keys: impl Into<Arc<dyn KeyGenerator>>) -> Self {
		self.keys = keys.into();
		self
	}

	/// The model registry.
	pub fn registry(&self) -> &ModelRegistry {
		&self.registry
	}

	/// Mutable access to the model registry.
	pub fn registry_mut(&mut self) -> &mut ModelRegistry {
		&mut self.registry
	}

	/// Namespace models are resolved in.
	pub fn namespace(&self) -> &str {
		&self.namespace
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

impl<E: StatementExecutor> FixtureDriver for ModelDriver<E> {
	fn build_records(&mut self, table: &str, fixtures: &FixtureSet) -> FixtureResult<BuiltRecords> {
		self.tracker.touch(table);
		let model = self.registry.resolve(&self.namespace, table)?;
		self.tracker.touch(model.table());

		let case = model.attribute_case();
		let builder = RecordBuilder::new(model.table(), Arc::clone(&self.keys), ColumnStyle::Model(case))
			.with_primary_key(model.primary_key());
		let now = Utc::now();

		let mut records = BuiltRecords::with_capacity(fixtures.len());
		for (label, columns) in fixtures {
			let mut record = builder.build(label, columns, model)?;
			if model.timestamps() {
				for column in TIMESTAMP_COLUMNS {
					let attribute = case.attribute(column);
					if !record.contains(&attribute) {
						record.set_mapped(attribute, column, now);
					}
				}
			}
			for link in record.join_links() {
				self.tracker.touch(link.table());
			}
			records.insert(label.clone(), record);
		}

		for record in records.values() {
			insert_row(&mut self.executor, model.table(), record.stored_columns())?;
			sync_join_rows(&mut self.executor, record)?;
		}

		tracing::info!(
			table,
			model = %model.qualified_name(),
			records = records.len(),
			"Loaded fixtures"
		);
		Ok(records)
	}

	fn truncate(&mut self) -> FixtureResult<usize> {
		self.tracker.truncate_all(&mut self.executor)
	}

	fn tracker(&self) -> &TruncationTracker {
		&self.tracker
	}
}

/// Replaces the owner's rows in each join table the record links through.
///
/// A relation given no targets still clears the owner's old rows.
fn sync_join_rows<E: StatementExecutor + ?Sized>(executor: &mut E, record: &Record) -> FixtureResult<()> {
	for link in record.join_links() {
		run(
			executor,
			&delete_where_sql(link.table(), link.owner_column()),
			&[SqlValue::Int(link.owner_key())],
		)?;
	}

	for row in record.join_rows() {
		insert_row(executor, row.table(), row.columns())?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::executor::RecordingExecutor;
	use crate::relations::RelationKind;
	use crate::value::FixtureValue;
	use crate::{columns, fixture_set};
	use rstest::{fixture, rstest};

	const NAMESPACE: &str = "app::models";

	#[fixture]
	fn registry() -> ModelRegistry {
		ModelRegistry::new()
			.with_model(
				ModelMetadata::new("Pirate", "pirates")
					.in_namespace(NAMESPACE)
					.belongs_to_many("catchphrases", "catchphrases")
					.has_one("parrot", "parrots"),
			)
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
					.with_timestamps(true),
			)
	}

	#[fixture]
	fn driver(registry: ModelRegistry) -> ModelDriver<RecordingExecutor> {
		ModelDriver::new(RecordingExecutor::new(), registry).with_namespace(NAMESPACE)
	}

	#[rstest]
	fn test_resolve_uses_singular_model_name(registry: ModelRegistry) {
		let model = registry.resolve(NAMESPACE, "pirates").unwrap();
		assert_eq!(model.qualified_name(), "app::models::Pirate");
		assert_eq!(registry.model_names().len(), 4);
	}

	#[rstest]
	fn test_unknown_model(mut driver: ModelDriver<RecordingExecutor>) {
		let result = driver.build_records("ships", &fixture_set! { "pearl" => columns! {} });
		match result {
			Err(error @ FixtureError::ModelResolution { .. }) => assert_eq!(
				error.to_string(),
				"Can't resolve a model for ships (looked for app::models::Ship)"
			),
			other => panic!("expected ModelResolution, got {:?}", other),
		}
		assert!(driver.executor().statements().is_empty());
	}

	#[rstest]
	fn test_belongs_to_sets_foreign_key(mut driver: ModelDriver<RecordingExecutor>) {
		let parrots = fixture_set! {
			"george" => columns! { "name" => "George", "pirate" => "blackbeard" },
		};
		let records = driver.build_records("parrots", &parrots).unwrap();

		assert_eq!(records["george"].get_i64("pirate_id"), Some(959118195));
		assert_eq!(
			driver.executor().sql(),
			["INSERT INTO parrots (id, name, pirate_id) VALUES (?, ?, ?)"]
		);
	}

	#[rstest]
	fn test_many_to_many_replaces_owner_rows(mut driver: ModelDriver<RecordingExecutor>) {
		let pirates = fixture_set! {
			"blackbeard" => columns! {
				"name" => "Edward Teach",
				"catchphrases" => vec!["batten", "fishes"],
			},
		};
		driver.build_records("pirates", &pirates).unwrap();

		let statements = driver.executor().statements();
		assert_eq!(
			driver.executor().sql(),
			[
				"INSERT INTO pirates (id, name) VALUES (?, ?)",
				"DELETE FROM catchphrase_pirate WHERE pirate_id = ?",
				"INSERT INTO catchphrase_pirate (pirate_id, catchphrase_id) VALUES (?, ?)",
				"INSERT INTO catchphrase_pirate (pirate_id, catchphrase_id) VALUES (?, ?)",
			]
		);
		assert_eq!(statements[1].params, [SqlValue::Int(959118195)]);
		assert_eq!(
			statements[3].params,
			[SqlValue::Int(959118195), SqlValue::Int(361067094)]
		);
		assert!(driver.tracker().contains("catchphrase_pirate"));
	}

	#[rstest]
	#[case(FixtureValue::from(Vec::<&str>::new()))]
	#[case(FixtureValue::Pivot(IndexMap::new()))]
	#[case(FixtureValue::from(""))]
	fn test_empty_many_to_many_clears_owner_rows(
		mut driver: ModelDriver<RecordingExecutor>,
		#[case] catchphrases: FixtureValue,
	) {
		let pirates = fixture_set! {
			"blackbeard" => columns! { "catchphrases" => catchphrases },
		};
		let records = driver.build_records("pirates", &pirates).unwrap();

		assert!(records["blackbeard"].join_rows().is_empty());
		assert_eq!(
			driver.executor().sql(),
			[
				"INSERT INTO pirates (id) VALUES (?)",
				"DELETE FROM catchphrase_pirate WHERE pirate_id = ?",
			]
		);
		assert_eq!(driver.executor().statements()[1].params, [SqlValue::Int(959118195)]);
		assert!(driver.tracker().contains("catchphrase_pirate"));
	}

	#[rstest]
	fn test_camel_case_model_inserts_fixture_column_names() {
		let registry = ModelRegistry::new().with_model(
			ModelMetadata::new("Address", "addresses")
				.in_namespace(NAMESPACE)
				.with_attribute_case(AttributeCase::CamelCase),
		);
		let mut driver = ModelDriver::new(RecordingExecutor::new(), registry).with_namespace(NAMESPACE);

		let records = driver
			.build_records(
				"addresses",
				&fixture_set! { "tortuga" => columns! { "line_1" => "Tortuga", "post__code" => "TT1" } },
			)
			.unwrap();

		assert_eq!(records["tortuga"].get_str("line1"), Some("Tortuga"));
		assert_eq!(
			driver.executor().sql(),
			["INSERT INTO addresses (id, line_1, post__code) VALUES (?, ?, ?)"]
		);
	}

	#[rstest]
	#[case("pirates", "parrot", RelationKind::HasOne, "parrots")]
	#[case("boats", "crew", RelationKind::HasMany, "crew")]
	fn test_wrong_side_relations_are_rejected(
		mut driver: ModelDriver<RecordingExecutor>,
		#[case] table: &str,
		#[case] attribute: &str,
		#[case] expected_kind: RelationKind,
		#[case] expected_other: &str,
	) {
		let set = fixture_set! {
			"first" => columns! { "name" => "ok" },
			"second" => columns! { attribute => "target" },
		};

		let result = driver.build_records(table, &set);

		match result {
			Err(FixtureError::InvalidRelationDirection { kind, table: on, other_table }) => {
				assert_eq!(kind, expected_kind);
				assert_eq!(on, table);
				assert_eq!(other_table, expected_other);
			}
			other => panic!("expected InvalidRelationDirection, got {:?}", other),
		}
		assert!(driver.executor().statements().is_empty());
	}

	#[rstest]
	fn test_timestamps_and_attribute_case(mut driver: ModelDriver<RecordingExecutor>) {
		let crew = fixture_set! {
			"jack" => columns! { "first_name" => "Jack" },
		};
		let records = driver.build_records("crew", &crew).unwrap();

		let jack = &records["jack"];
		assert_eq!(jack.get_str("firstName"), Some("Jack"));
		assert!(matches!(jack.get("createdAt"), Some(SqlValue::Timestamp(_))));
		assert_eq!(jack.get("createdAt"), jack.get("updatedAt"));
		assert_eq!(
			driver.executor().sql(),
			["INSERT INTO crew (id, first_name, created_at, updated_at) VALUES (?, ?, ?, ?)"]
		);
	}

	#[rstest]
	fn test_supplied_timestamp_is_kept(mut driver: ModelDriver<RecordingExecutor>) {
		let crew = fixture_set! {
			"jack" => columns! { "created_at" => "2020-01-01 00:00:00" },
		};
		let records = driver.build_records("crew", &crew).unwrap();
		assert_eq!(records["jack"].get_str("createdAt"), Some("2020-01-01 00:00:00"));
		assert!(records["jack"].contains("updatedAt"));
	}
}
