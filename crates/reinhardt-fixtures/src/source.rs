//! Fixture sources.
//!
//! A fixture file holds one table's fixtures as a mapping from label to
//! columns, in JSON or YAML (with the `yaml` feature):
//!
//! ```json
//! {
//!   "polly": { "id": 4, "name": "Polly" },
//!   "george": { "name": "George", "pirate": "blackbeard" }
//! }
//! ```
//!
//! Label order in the file is the build order.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{FixtureError, FixtureResult};
use crate::value::{ColumnMap, FixtureSet, FixtureValue};

/// Supported fixture file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FixtureFormat {
	/// JSON format (default).
	#[default]
	Json,

	/// YAML format (requires `yaml` feature).
	Yaml,
}

impl FixtureFormat {
	/// Extensions probed for a table, in order of preference.
	pub const EXTENSIONS: [&'static str; 3] = ["json", "yaml", "yml"];

	/// Determines the fixture format from a file extension.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_fixtures::source::FixtureFormat;
	/// assert_eq!(FixtureFormat::from_extension("json"), Some(FixtureFormat::Json));
	/// assert_eq!(FixtureFormat::from_extension("yml"), Some(FixtureFormat::Yaml));
	/// assert_eq!(FixtureFormat::from_extension("xml"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			_ => None,
		}
	}

	/// Determines the fixture format from a file path.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}
}

impl fmt::Display for FixtureFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Json => write!(f, "JSON"),
			Self::Yaml => write!(f, "YAML"),
		}
	}
}

/// Parser for fixture files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureParser;

impl FixtureParser {
	/// Creates a new fixture parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a fixture file, picking the format from its extension.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The file extension is not recognized
	/// - The file cannot be read
	/// - The content is not a mapping of labels to column mappings
	pub fn parse_file(&self, path: &Path) -> FixtureResult<FixtureSet> {
		let format = FixtureFormat::from_path(path).ok_or_else(|| {
			FixtureError::UnsupportedExtension(
				path.extension()
					.and_then(|e| e.to_str())
					.unwrap_or("(none)")
					.to_string(),
			)
		})?;

		let content = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				FixtureError::FileNotFound(path.display().to_string())
			} else {
				FixtureError::IoError(e)
			}
		})?;

		self.parse_string(&content, format).map_err(|e| match e {
			FixtureError::ParseError(message) => {
				FixtureError::ParseError(format!("{}: {}", path.display(), message))
			}
			other => other,
		})
	}

	/// Parses fixture content in the given format.
	pub fn parse_string(&self, content: &str, format: FixtureFormat) -> FixtureResult<FixtureSet> {
		let document: serde_json::Value = match format {
			FixtureFormat::Json => serde_json::from_str(content)?,
			FixtureFormat::Yaml => self.parse_yaml(content)?,
		};
		self.fixture_set(document)
	}

	#[cfg(feature = "yaml")]
	fn parse_yaml(&self, content: &str) -> FixtureResult<serde_json::Value> {
		if content.trim().is_empty() {
			return Ok(serde_json::Value::Object(serde_json::Map::new()));
		}
		Ok(serde_yaml::from_str(content)?)
	}

	/// Stub for YAML parsing when the feature is not enabled.
	#[cfg(not(feature = "yaml"))]
	fn parse_yaml(&self, _content: &str) -> FixtureResult<serde_json::Value> {
		Err(FixtureError::UnsupportedExtension(
			"YAML support requires the 'yaml' feature".to_string(),
		))
	}

	fn fixture_set(&self, document: serde_json::Value) -> FixtureResult<FixtureSet> {
		let fixtures = match document {
			serde_json::Value::Object(fixtures) => fixtures,
			serde_json::Value::Null => return Ok(FixtureSet::new()),
			_ => {
				return Err(FixtureError::ParseError(
					"Expected a mapping of labels to columns".to_string(),
				));
			}
		};

		let mut set = FixtureSet::with_capacity(fixtures.len());
		for (label, columns) in fixtures {
			let columns = match columns {
				serde_json::Value::Object(columns) => columns,
				serde_json::Value::Null => serde_json::Map::new(),
				other => {
					return Err(FixtureError::ParseError(format!(
						"Fixture {} must be a mapping of columns, found {}",
						label, other
					)));
				}
			};

			let mut column_map = ColumnMap::with_capacity(columns.len());
			for (column, value) in columns {
				let value = FixtureValue::from_json(value).map_err(|message| {
					FixtureError::ParseError(format!("{}.{}: {}", label, column, message))
				})?;
				column_map.insert(column, value);
			}
			set.insert(label, column_map);
		}

		Ok(set)
	}
}

/// Supplies the fixture set of a table.
pub trait FixtureSource {
	/// Returns the fixtures of `table`, in build order.
	///
	/// # Errors
	///
	/// [`FixtureError::FixtureNotFound`] if the source has nothing for the table.
	fn fixture_set(&self, table: &str) -> FixtureResult<FixtureSet>;

	/// Tables the source has fixtures for, sorted.
	fn tables(&self) -> FixtureResult<Vec<String>>;
}

/// Reads `<location>/<table>.json`, `.yaml` or `.yml`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
	location: PathBuf,
	parser: FixtureParser,
}

impl DirectorySource {
	/// Creates a source reading from `location`.
	pub fn new(location: impl Into<PathBuf>) -> Self {
		Self {
			location: location.into(),
			parser: FixtureParser::new(),
		}
	}

	/// Fixture directory.
	pub fn location(&self) -> &Path {
		&self.location
	}

	/// Path of the fixture file used for `table`, if any.
	///
	/// When the table has files in several formats the first of
	/// [`FixtureFormat::EXTENSIONS`] wins.
	pub fn path_for(&self, table: &str) -> Option<PathBuf> {
		let mut found = FixtureFormat::EXTENSIONS
			.iter()
			.map(|ext| self.location.join(format!("{}.{}", table, ext)))
			.filter(|path| path.is_file());
		let first = found.next()?;
		let ignored: Vec<String> = found.map(|path| path.display().to_string()).collect();
		if !ignored.is_empty() {
			tracing::warn!(
				table,
				used = %first.display(),
				ignored = ?ignored,
				"Fixture file exists in more than one format"
			);
		}
		Some(first)
	}
}

impl FixtureSource for DirectorySource {
	fn fixture_set(&self, table: &str) -> FixtureResult<FixtureSet> {
		let path = self
			.path_for(table)
			.ok_or_else(|| FixtureError::FixtureNotFound(table.to_string()))?;
		tracing::debug!(table, path = %path.display(), "Reading fixture file");
		self.parser.parse_file(&path)
	}

	fn tables(&self) -> FixtureResult<Vec<String>> {
		let entries = std::fs::read_dir(&self.location).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				FixtureError::FileNotFound(self.location.display().to_string())
			} else {
				FixtureError::IoError(e)
			}
		})?;

		let mut tables = BTreeSet::new();
		for entry in entries {
			let path = entry?.path();
			if !path.is_file() || FixtureFormat::from_path(&path).is_none() {
				continue;
			}
			if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
				tables.insert(stem.to_string());
			}
		}
		Ok(tables.into_iter().collect())
	}
}

/// Fixture sets held in memory.
///
/// The only source that can carry computed values.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
	sets: HashMap<String, FixtureSet>,
}

impl MemorySource {
	/// Creates an empty source.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces the fixtures of `table`.
	pub fn insert(&mut self, table: impl Into<String>, fixtures: FixtureSet) -> &mut Self {
		self.sets.insert(table.into(), fixtures);
		self
	}

	/// Adds the fixtures of `table`, builder style.
	pub fn with(mut self, table: impl Into<String>, fixtures: FixtureSet) -> Self {
		self.insert(table, fixtures);
		self
	}
}

impl FixtureSource for MemorySource {
	fn fixture_set(&self, table: &str) -> FixtureResult<FixtureSet> {
		self.sets
			.get(table)
			.cloned()
			.ok_or_else(|| FixtureError::FixtureNotFound(table.to_string()))
	}

	fn tables(&self) -> FixtureResult<Vec<String>> {
		let mut tables: Vec<String> = self.sets.keys().cloned().collect();
		tables.sort();
		Ok(tables)
	}
}
