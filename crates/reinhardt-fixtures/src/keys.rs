//! Deterministic key generation.
//!
//! Fixture labels are turned into integer primary keys by hashing them, so a
//! record and every record pointing at it agree on the key without a lookup
//! and without an auto-increment sequence. Collisions are possible and are not
//! detected.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::{FixtureError, FixtureResult};

/// Upper bound (inclusive) of keys produced by [`Crc32KeyGenerator`], `2^30 - 1`.
pub const MAX_ID: i64 = (1 << 30) - 1;

/// Maps a fixture label to an integer key.
///
/// Implementations must be pure: the same label always yields the same key,
/// across processes and runs.
pub trait KeyGenerator: Debug + Send + Sync {
	/// Generates the key for `label`. Every string, including the empty one, is valid.
	fn generate_key(&self, label: &str) -> i64;
}

/// CRC-32 of the label's UTF-8 bytes reduced modulo [`MAX_ID`].
///
/// This is the same scheme Rails uses for fixture ids.
///
/// # Example
///
/// ```
/// use reinhardt_fixtures::keys::{Crc32KeyGenerator, KeyGenerator};
///
/// let keys = Crc32KeyGenerator::new();
/// assert_eq!(keys.generate_key("george"), 380982691);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32KeyGenerator;

impl Crc32KeyGenerator {
	/// Creates the generator.
	pub fn new() -> Self {
		Self
	}
}

impl KeyGenerator for Crc32KeyGenerator {
	fn generate_key(&self, label: &str) -> i64 {
		i64::from(crc32fast::hash(label.as_bytes())) % MAX_ID
	}
}

/// SHA-1 of the label read as a decimal number, truncated to a fixed digit count.
///
/// Keys are much larger than CRC-32 keys, so columns must be 64-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sha1KeyGenerator {
	length: usize,
}

impl Sha1KeyGenerator {
	/// Default number of decimal digits.
	pub const DEFAULT_LENGTH: usize = 10;

	/// Largest digit count that still fits an `i64`.
	pub const MAX_LENGTH: usize = 18;

	/// Creates a generator producing keys of [`Self::DEFAULT_LENGTH`] digits.
	pub fn new() -> Self {
		Self {
			length: Self::DEFAULT_LENGTH,
		}
	}

	/// Creates a generator producing keys of `length` digits.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::InvalidConfiguration`] unless `1 <= length <= 18`.
	pub fn with_length(length: usize) -> FixtureResult<Self> {
		if length == 0 || length > Self::MAX_LENGTH {
			return Err(FixtureError::InvalidConfiguration(format!(
				"SHA-1 key length must be between 1 and {}, got {}",
				Self::MAX_LENGTH,
				length
			)));
		}
		Ok(Self { length })
	}

	/// Returns the configured digit count.
	pub fn length(&self) -> usize {
		self.length
	}
}

impl Default for Sha1KeyGenerator {
	fn default() -> Self {
		Self::new()
	}
}

impl KeyGenerator for Sha1KeyGenerator {
	fn generate_key(&self, label: &str) -> i64 {
		let digest = Sha1::digest(label.as_bytes());
		let decimal = to_decimal(&digest);
		decimal
			.bytes()
			.take(self.length)
			.fold(0i64, |key, digit| key * 10 + i64::from(digit - b'0'))
	}
}

/// Writes a big-endian unsigned integer in base 10.
fn to_decimal(bytes: &[u8]) -> String {
	// Little-endian base-10 digits
	let mut digits: Vec<u8> = vec![0];
	for &byte in bytes {
		let mut carry = u32::from(byte);
		for digit in digits.iter_mut() {
			let value = u32::from(*digit) * 256 + carry;
			*digit = (value % 10) as u8;
			carry = value / 10;
		}
		while carry > 0 {
			digits.push((carry % 10) as u8);
			carry /= 10;
		}
	}
	while digits.len() > 1 && digits.last() == Some(&0) {
		digits.pop();
	}
	digits.iter().rev().map(|d| char::from(b'0' + d)).collect()
}

/// Key generation strategy selected in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum KeyStrategy {
	/// [`Crc32KeyGenerator`].
	#[default]
	Crc32,
	/// [`Sha1KeyGenerator`] with the given digit count.
	Sha1 {
		/// Number of decimal digits.
		#[serde(default = "default_sha1_length")]
		length: usize,
	},
}

fn default_sha1_length() -> usize {
	Sha1KeyGenerator::DEFAULT_LENGTH
}

impl KeyStrategy {
	/// Builds the generator for this strategy.
	pub fn build(&self) -> FixtureResult<Box<dyn KeyGenerator>> {
		match *self {
			Self::Crc32 => Ok(Box::new(Crc32KeyGenerator::new())),
			Self::Sha1 { length } => Ok(Box::new(Sha1KeyGenerator::with_length(length)?)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_max_id() {
		assert_eq!(MAX_ID, 1073741823);
	}

	#[rstest]
	#[case("foo", 208889123)]
	#[case("george", 380982691)]
	#[case("blackbeard", 959118195)]
	#[case("batten", 361330166)]
	#[case("fishes", 361067094)]
	#[case("blow", 497172778)]
	#[case("", 0)]
	fn test_crc32_reference_keys(#[case] label: &str, #[case] expected: i64) {
		assert_eq!(Crc32KeyGenerator::new().generate_key(label), expected);
	}

	#[rstest]
	fn test_crc32_is_deterministic_and_bounded() {
		let keys = Crc32KeyGenerator::new();
		for label in ["polly", "louis", "redbeard", "ünïcödé", "a much longer label with spaces"] {
			let key = keys.generate_key(label);
			assert_eq!(key, keys.generate_key(label));
			assert!((0..=MAX_ID).contains(&key));
		}
	}

	#[rstest]
	fn test_sha1_default_length() {
		let keys = Sha1KeyGenerator::new();
		let key = keys.generate_key("foo");
		assert_eq!(key, 6812387308);
		assert_eq!(key.to_string().len(), 10);
	}

	#[rstest]
	fn test_sha1_custom_length() {
		let keys = Sha1KeyGenerator::with_length(8).unwrap();
		assert_eq!(keys.generate_key("foo"), 68123873);
	}

	#[rstest]
	#[case(0)]
	#[case(19)]
	fn test_sha1_rejects_bad_length(#[case] length: usize) {
		let result = Sha1KeyGenerator::with_length(length);
		assert!(matches!(result, Err(FixtureError::InvalidConfiguration(_))));
	}

	#[rstest]
	fn test_to_decimal() {
		assert_eq!(to_decimal(&[]), "0");
		assert_eq!(to_decimal(&[0x01, 0x00]), "256");
		assert_eq!(to_decimal(&[0x00, 0xff, 0xff]), "65535");
	}

	#[rstest]
	fn test_strategy_build() {
		let crc = KeyStrategy::Crc32.build().unwrap();
		assert_eq!(crc.generate_key("george"), 380982691);

		let sha = KeyStrategy::Sha1 { length: 10 }.build().unwrap();
		assert_eq!(sha.generate_key("foo"), 6812387308);

		assert!(KeyStrategy::Sha1 { length: 40 }.build().is_err());
	}

	#[rstest]
	fn test_strategy_deserialize() {
		let strategy: KeyStrategy = serde_json::from_str(r#"{"strategy": "sha1"}"#).unwrap();
		assert_eq!(strategy, KeyStrategy::Sha1 { length: 10 });

		let strategy: KeyStrategy = serde_json::from_str(r#"{"strategy": "crc32"}"#).unwrap();
		assert_eq!(strategy, KeyStrategy::Crc32);
	}
}
