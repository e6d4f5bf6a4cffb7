//! Settings-driven harness tests.

mod helpers;

use std::fs;

use helpers::schema::{NAMESPACE, connection, registry};
use helpers::test_data::TestDataLoader;
use reinhardt_fixtures::prelude::*;
use rstest::rstest;
use tempfile::TempDir;

fn settings_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
	let path = dir.path().join("fixtures.toml");
	fs::write(&path, content).unwrap();
	path
}

#[rstest]
fn test_model_harness_from_settings() {
	let dir = TempDir::new().unwrap();
	let data = TestDataLoader::new();
	let path = settings_file(
		&dir,
		&format!(
			"location = {:?}\ndriver = \"model\"\nnamespace = \"{}\"\n",
			data.base_path().display().to_string(),
			NAMESPACE
		),
	);
	let settings = FixtureSettings::from_file(&path).unwrap();

	let mut fixtures = Fixtures::from_settings(&settings, connection(), registry()).unwrap();
	assert_eq!(fixtures.up(&["catchphrases", "pirates", "parrots"]).unwrap(), 8);

	let george = fixtures.get("parrots", "george").unwrap();
	let blackbeard = fixtures.get("pirates", "blackbeard").unwrap();
	assert_eq!(george.get_i64("pirate_id"), blackbeard.get_i64("id"));
	assert_eq!(blackbeard.join_rows().len(), 3);

	assert_eq!(fixtures.down().unwrap(), 4);
	assert!(fixtures.loaded_tables().next().is_none());
}

#[rstest]
fn test_sha1_keys_from_settings() {
	let dir = TempDir::new().unwrap();
	fs::write(
		dir.path().join("parrots.json"),
		r#"{"george": {"name": "George", "pirate_id": "blackbeard"}}"#,
	)
	.unwrap();
	let settings = FixtureSettings::from_toml_str(&format!(
		"location = {:?}\n[key_generator]\nstrategy = \"sha1\"\n",
		dir.path().display().to_string()
	))
	.unwrap();

	let driver = settings.standard_driver(RecordingExecutor::new()).unwrap();
	let mut fixtures = Fixtures::new(driver, settings.source());
	fixtures.up_all().unwrap();

	let george = fixtures.get("parrots", "george").unwrap();
	assert_eq!(george.get_i64("id"), Some(9125658650));
	assert_eq!(george.get_i64("pirate_id"), Some(1327310807));
}

#[rstest]
fn test_standard_driver_rejects_undeclared_relations() {
	let settings = FixtureSettings::new().with_location(TestDataLoader::new().base_path());
	let driver = settings.standard_driver(RecordingExecutor::new()).unwrap();
	let mut fixtures = Fixtures::new(driver, settings.source());

	let error = fixtures.up(&["pirates"]).unwrap_err();

	match error {
		FixtureError::InvalidValue { table, label, column, .. } => {
			assert_eq!((table.as_str(), label.as_str(), column.as_str()), ("pirates", "reginald", "catchphrases"));
		}
		other => panic!("expected InvalidValue, got {:?}", other),
	}
	assert!(fixtures.driver().executor().statements().is_empty());
	assert!(fixtures.driver().tracker().contains("pirates"));
}
