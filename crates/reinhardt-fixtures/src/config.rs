//! Fixture settings.
//!
//! Settings can be built in code or loaded from TOML or JSON:
//!
//! ```toml
//! location = "tests/fixtures"
//! driver = "model"
//! namespace = "app::models"
//!
//! [key_generator]
//! strategy = "sha1"
//! length = 12
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::drivers::{FixtureDriver, ModelDriver, ModelRegistry, StandardDriver};
use crate::error::{FixtureError, FixtureResult};
use crate::executor::StatementExecutor;
use crate::keys::{KeyGenerator, KeyStrategy};
use crate::naming::SuffixConvention;
use crate::source::DirectorySource;

/// Which driver loads fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
	/// [`StandardDriver`]
	#[default]
	Standard,
	/// [`ModelDriver`]
	Model,
}

impl FromStr for DriverKind {
	type Err = FixtureError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"standard" => Ok(Self::Standard),
			"model" => Ok(Self::Model),
			other => Err(FixtureError::InvalidConfiguration(format!(
				"unknown driver '{}', expected 'standard' or 'model'",
				other
			))),
		}
	}
}

impl fmt::Display for DriverKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Standard => write!(f, "standard"),
			Self::Model => write!(f, "model"),
		}
	}
}

/// Settings for loading fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureSettings {
	/// Directory holding `<table>.json` / `<table>.yaml` files
	#[serde(default = "default_location")]
	pub location: PathBuf,

	/// Driver used to load fixtures
	#[serde(default)]
	pub driver: DriverKind,

	/// Key generation strategy
	#[serde(default)]
	pub key_generator: KeyStrategy,

	/// Namespace models are resolved in (model driver)
	#[serde(default)]
	pub namespace: String,

	/// Foreign key column suffix (standard driver)
	#[serde(default = "default_foreign_key_suffix")]
	pub foreign_key_suffix: String,
}

fn default_location() -> PathBuf {
	PathBuf::from("tests/fixtures")
}

fn default_foreign_key_suffix() -> String {
	SuffixConvention::DEFAULT_SUFFIX.to_string()
}

impl Default for FixtureSettings {
	fn default() -> Self {
		Self {
			location: default_location(),
			driver: DriverKind::default(),
			key_generator: KeyStrategy::default(),
			namespace: String::new(),
			foreign_key_suffix: default_foreign_key_suffix(),
		}
	}
}

impl FixtureSettings {
	/// Creates default settings.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the fixture directory.
	pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
		self.location = location.into();
		self
	}

	/// Sets the driver.
	pub fn with_driver(mut self, driver: DriverKind) -> Self {
		self.driver = driver;
		self
	}

	/// Sets the key generation strategy.
	pub fn with_key_generator(mut self, strategy: KeyStrategy) -> Self {
		self.key_generator = strategy;
		self
	}

	/// Sets the model namespace.
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = namespace.into();
		self
	}

	/// Sets the foreign key suffix.
	pub fn with_foreign_key_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.foreign_key_suffix = suffix.into();
		self
	}

	/// Parses TOML settings.
	pub fn from_toml_str(content: &str) -> FixtureResult<Self> {
		let settings: Self = toml::from_str(content)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Parses JSON settings.
	pub fn from_json_str(content: &str) -> FixtureResult<Self> {
		let settings: Self = serde_json::from_str(content)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Loads settings from a `.toml` or `.json` file.
	pub fn from_file(path: impl AsRef<Path>) -> FixtureResult<Self> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				FixtureError::FileNotFound(path.display().to_string())
			} else {
				FixtureError::IoError(e)
			}
		})?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => Self::from_json_str(&contents),
			other => Err(FixtureError::UnsupportedExtension(format!(
				"{} (supported formats: .toml, .json)",
				other.unwrap_or("(none)")
			))),
		}
	}

	/// Checks values serde cannot check.
	pub fn validate(&self) -> FixtureResult<()> {
		if self.foreign_key_suffix.is_empty() {
			return Err(FixtureError::InvalidConfiguration(
				"foreign_key_suffix must not be empty".to_string(),
			));
		}
		self.key_generator.build()?;
		Ok(())
	}

	/// Builds the configured key generator.
	pub fn key_generator(&self) -> FixtureResult<Box<dyn KeyGenerator>> {
		self.key_generator.build()
	}

	/// Foreign key convention for the standard driver.
	pub fn foreign_key_convention(&self) -> SuffixConvention {
		SuffixConvention::new(self.foreign_key_suffix.as_str())
	}

	/// Fixture source reading from [`Self::location`].
	pub fn source(&self) -> DirectorySource {
		DirectorySource::new(self.location.as_path())
	}

	/// Standard driver configured from these settings.
	pub fn standard_driver<E: StatementExecutor>(&self, executor: E) -> FixtureResult<StandardDriver<E>> {
		let keys: Arc<dyn KeyGenerator> = self.key_generator()?.into();
		Ok(StandardDriver::new(executor)
			.with_key_generator(keys)
			.with_foreign_key_convention(self.foreign_key_convention()))
	}

	/// Model driver configured from these settings.
	pub fn model_driver<E: StatementExecutor>(
		&self,
		executor: E,
		registry: ModelRegistry,
	) -> FixtureResult<ModelDriver<E>> {
		let keys: Arc<dyn KeyGenerator> = self.key_generator()?.into();
		Ok(ModelDriver::new(executor, registry)
			.with_namespace(self.namespace.as_str())
			.with_key_generator(keys))
	}

	/// The driver selected by [`Self::driver`].
	///
	/// `registry` is only used by the model driver.
	pub fn driver<E: StatementExecutor + 'static>(
		&self,
		executor: E,
		registry: ModelRegistry,
	) -> FixtureResult<Box<dyn FixtureDriver>> {
		tracing::debug!(driver = %self.driver, "Creating fixture driver");
		Ok(match self.driver {
			DriverKind::Standard => Box::new(self.standard_driver(executor)?),
			DriverKind::Model => Box::new(self.model_driver(executor, registry)?),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::executor::RecordingExecutor;
	use crate::keys::Sha1KeyGenerator;
	use crate::naming::ForeignKeyConvention;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	fn test_defaults() {
		let settings = FixtureSettings::default();
		assert_eq!(settings.location, PathBuf::from("tests/fixtures"));
		assert_eq!(settings.driver, DriverKind::Standard);
		assert_eq!(settings.key_generator, KeyStrategy::Crc32);
		assert_eq!(settings.foreign_key_suffix, "_id");
		assert_eq!(settings.key_generator().unwrap().generate_key("george"), 380982691);
	}

	#[rstest]
	fn test_from_toml() {
		let settings = FixtureSettings::from_toml_str(
			r#"
			location = "fixtures"
			driver = "model"
			namespace = "app::models"

			[key_generator]
			strategy = "sha1"
			length = 8
			"#,
		)
		.unwrap();

		assert_eq!(settings.location, PathBuf::from("fixtures"));
		assert_eq!(settings.driver, DriverKind::Model);
		assert_eq!(settings.namespace, "app::models");
		assert_eq!(settings.key_generator, KeyStrategy::Sha1 { length: 8 });
		assert_eq!(settings.key_generator().unwrap().generate_key("foo"), 68123873);
	}

	#[rstest]
	fn test_from_json_with_default_sha1_length() {
		let settings =
			FixtureSettings::from_json_str(r#"{"key_generator": {"strategy": "sha1"}}"#).unwrap();
		assert_eq!(
			settings.key_generator,
			KeyStrategy::Sha1 {
				length: Sha1KeyGenerator::DEFAULT_LENGTH
			}
		);
		assert_eq!(settings.location, PathBuf::from("tests/fixtures"));
	}

	#[rstest]
	#[case(r#"{"key_generator": {"strategy": "sha1", "length": 0}}"#)]
	#[case(r#"{"key_generator": {"strategy": "sha1", "length": 19}}"#)]
	#[case(r#"{"foreign_key_suffix": ""}"#)]
	fn test_invalid_values(#[case] content: &str) {
		let error = FixtureSettings::from_json_str(content).unwrap_err();
		assert!(matches!(error, FixtureError::InvalidConfiguration(_)), "{:?}", error);
	}

	#[rstest]
	fn test_unknown_driver() {
		assert!(matches!(
			FixtureSettings::from_toml_str(r#"driver = "eloquent""#),
			Err(FixtureError::TomlError(_))
		));
		assert!(matches!(
			"eloquent".parse::<DriverKind>(),
			Err(FixtureError::InvalidConfiguration(_))
		));
		assert_eq!("Model".parse::<DriverKind>().unwrap(), DriverKind::Model);
	}

	#[rstest]
	fn test_from_file() {
		let dir = TempDir::new().unwrap();
		let toml_path = dir.path().join("fixtures.toml");
		std::fs::write(&toml_path, "foreign_key_suffix = \"_ref\"\n").unwrap();
		let yaml_path = dir.path().join("fixtures.yaml");
		std::fs::write(&yaml_path, "driver: model\n").unwrap();

		let settings = FixtureSettings::from_file(&toml_path).unwrap();
		assert!(settings.foreign_key_convention().is_foreign_key("pirate_ref"));
		assert!(matches!(
			FixtureSettings::from_file(&yaml_path),
			Err(FixtureError::UnsupportedExtension(_))
		));
		assert!(matches!(
			FixtureSettings::from_file(dir.path().join("missing.toml")),
			Err(FixtureError::FileNotFound(_))
		));
	}

	#[rstest]
	fn test_driver_selection() {
		let registry = ModelRegistry::new();
		let standard = FixtureSettings::new()
			.driver(RecordingExecutor::new(), registry.clone())
			.unwrap();
		assert!(standard.tracker().is_empty());

		let model = FixtureSettings::new()
			.with_driver(DriverKind::Model)
			.with_namespace("app")
			.model_driver(RecordingExecutor::new(), registry)
			.unwrap();
		assert_eq!(model.namespace(), "app");
	}
}
