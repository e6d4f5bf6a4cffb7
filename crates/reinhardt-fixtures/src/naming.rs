//! Naming conventions.
//!
//! Fixtures are written with snake_case column names and plural table names.
//! This module maps those to model names, attribute names and foreign key
//! columns, and holds the standard driver's foreign-key column heuristic as an
//! explicit, replaceable [`ForeignKeyConvention`].

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Decides which schema-free columns hold foreign keys.
///
/// The standard driver hashes non-numeric values of these columns into keys.
pub trait ForeignKeyConvention: Debug + Send + Sync {
	/// Returns true if `column` holds a foreign key.
	fn is_foreign_key(&self, column: &str) -> bool;
}

/// Treats columns ending with a suffix (`_id` by default) as foreign keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixConvention {
	suffix: String,
}

impl SuffixConvention {
	/// Default foreign key suffix.
	pub const DEFAULT_SUFFIX: &'static str = "_id";

	/// Creates a convention for the given suffix.
	pub fn new(suffix: impl Into<String>) -> Self {
		Self {
			suffix: suffix.into(),
		}
	}

	/// The configured suffix.
	pub fn suffix(&self) -> &str {
		&self.suffix
	}
}

impl Default for SuffixConvention {
	fn default() -> Self {
		Self::new(Self::DEFAULT_SUFFIX)
	}
}

impl ForeignKeyConvention for SuffixConvention {
	fn is_foreign_key(&self, column: &str) -> bool {
		!self.suffix.is_empty() && column.len() > self.suffix.len() && column.ends_with(&self.suffix)
	}
}

/// Never treats a column as a foreign key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoForeignKeys;

impl ForeignKeyConvention for NoForeignKeys {
	fn is_foreign_key(&self, _column: &str) -> bool {
		false
	}
}

/// How a model spells its attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeCase {
	/// Attributes are the snake_case column names (e.g. "pirate_id").
	#[default]
	Preserve,
	/// Attributes are camelCase (e.g. "pirateId").
	CamelCase,
}

impl AttributeCase {
	/// Converts a wire-form column name to an attribute name.
	pub fn attribute(&self, column: &str) -> String {
		match self {
			Self::Preserve => column.to_string(),
			Self::CamelCase => to_camel_case(column),
		}
	}
}

/// Convert a snake_case string to PascalCase.
///
/// # Examples
///
/// ```rust
/// use reinhardt_fixtures::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("pirate"), "Pirate");
/// assert_eq!(to_pascal_case("ship_crew"), "ShipCrew");
/// ```
pub fn to_pascal_case(s: &str) -> String {
	let mut result = String::with_capacity(s.len());
	let mut capitalize_next = true;

	for ch in s.chars() {
		if ch == '_' || ch == '-' || ch == ' ' {
			capitalize_next = true;
		} else if capitalize_next {
			result.push(ch.to_ascii_uppercase());
			capitalize_next = false;
		} else {
			result.push(ch);
		}
	}

	result
}

/// Convert a snake_case string to camelCase.
///
/// # Examples
///
/// ```rust
/// use reinhardt_fixtures::naming::to_camel_case;
///
/// assert_eq!(to_camel_case("pirate_id"), "pirateId");
/// assert_eq!(to_camel_case("name"), "name");
/// ```
pub fn to_camel_case(s: &str) -> String {
	let pascal = to_pascal_case(s);
	let mut chars = pascal.chars();
	match chars.next() {
		Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
		None => String::new(),
	}
}

/// Irregular English plurals seen in table names.
const IRREGULAR: &[(&str, &str)] = &[
	("people", "person"),
	("men", "man"),
	("women", "woman"),
	("children", "child"),
	("mice", "mouse"),
	("geese", "goose"),
	("feet", "foot"),
	("teeth", "tooth"),
];

/// Words that are the same in singular and plural.
const UNCOUNTABLE: &[&str] = &[
	"crew", "data", "equipment", "fish", "information", "news", "series", "sheep", "species",
];

/// Singularize the last word of a snake_case table name.
///
/// Covers regular English plurals and a short list of irregular and
/// uncountable words; anything else is returned unchanged.
///
/// # Examples
///
/// ```rust
/// use reinhardt_fixtures::naming::singularize;
///
/// assert_eq!(singularize("pirates"), "pirate");
/// assert_eq!(singularize("catchphrases"), "catchphrase");
/// assert_eq!(singularize("crew"), "crew");
/// assert_eq!(singularize("ship_parties"), "ship_party");
/// ```
pub fn singularize(word: &str) -> String {
	let (prefix, last) = match word.rfind('_') {
		Some(idx) => word.split_at(idx + 1),
		None => ("", word),
	};
	let lower = last.to_ascii_lowercase();

	if UNCOUNTABLE.contains(&lower.as_str()) {
		return word.to_string();
	}
	if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
		return format!("{}{}", prefix, singular);
	}

	let singular = if let Some(stem) = last.strip_suffix("ies").filter(|s| !s.is_empty()) {
		format!("{}y", stem)
	} else if let Some(stem) = last.strip_suffix("sses") {
		format!("{}ss", stem)
	} else if ["ches", "shes", "xes", "zes"].iter().any(|s| last.ends_with(s)) {
		last[..last.len() - 2].to_string()
	} else if last.ends_with("ss") || last.ends_with("us") || last.ends_with("is") {
		last.to_string()
	} else if let Some(stem) = last.strip_suffix('s') {
		stem.to_string()
	} else {
		last.to_string()
	};

	format!("{}{}", prefix, singular)
}

/// Model type name for a table: singular, PascalCase.
///
/// # Examples
///
/// ```rust
/// use reinhardt_fixtures::naming::model_name_for_table;
///
/// assert_eq!(model_name_for_table("pirates"), "Pirate");
/// assert_eq!(model_name_for_table("ship_parties"), "ShipParty");
/// ```
pub fn model_name_for_table(table: &str) -> String {
	to_pascal_case(&singularize(table))
}

/// Conventional foreign key column pointing at `table`, e.g. "pirates" -> "pirate_id".
pub fn foreign_key_for_table(table: &str) -> String {
	format!("{}{}", singularize(table), SuffixConvention::DEFAULT_SUFFIX)
}
