//! Test data loader helper.
//!
//! Provides access to the fixture files under `tests/fixtures/data`.

use std::path::{Path, PathBuf};

use reinhardt_fixtures::source::DirectorySource;

/// Test data loader for fixture files.
pub struct TestDataLoader {
	base_path: PathBuf,
}

impl TestDataLoader {
	/// Create a loader for the crate's `tests/fixtures/data` directory.
	pub fn new() -> Self {
		Self {
			base_path: Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data"),
		}
	}

	/// Base directory.
	pub fn base_path(&self) -> &Path {
		&self.base_path
	}

	/// Fixture source over the base directory.
	pub fn source(&self) -> DirectorySource {
		DirectorySource::new(&self.base_path)
	}
}

impl Default for TestDataLoader {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_fixtures::source::FixtureSource;

	#[rstest::rstest]
	fn test_test_data_loader_finds_data() {
		let loader = TestDataLoader::new();
		assert!(loader.base_path().join("pirates.json").is_file());
		assert_eq!(loader.source().tables().unwrap(), ["catchphrases", "parrots", "pirates"]);
	}
}
