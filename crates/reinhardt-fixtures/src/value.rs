//! Fixture value model.
//!
//! A fixture is a label plus an ordered [`ColumnMap`]. Every column value is
//! classified once, when the fixture is constructed or parsed, into a
//! [`FixtureValue`] variant:
//!
//! - [`FixtureValue::Scalar`] - a plain column value, or a single relation target label
//! - [`FixtureValue::List`] - several relation target labels
//! - [`FixtureValue::Pivot`] - relation target labels with extra join-row attributes
//! - [`FixtureValue::Computed`] - a function of the record being built

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::record::Record;

/// Ordered mapping from column name to raw fixture value.
pub type ColumnMap = IndexMap<String, FixtureValue>;

/// Ordered mapping from fixture label to its columns, for one table.
pub type FixtureSet = IndexMap<String, ColumnMap>;

/// Extra attributes stored on a many-to-many join row.
pub type PivotAttributes = IndexMap<String, SqlValue>;

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
	/// SQL NULL
	Null,
	/// Boolean
	Bool(bool),
	/// Integer
	Int(i64),
	/// Floating point
	Float(f64),
	/// Text
	Text(String),
	/// UTC timestamp
	Timestamp(DateTime<Utc>),
}

impl SqlValue {
	/// Returns true for [`SqlValue::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Returns the integer value, if any.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the integer value, parsing text that holds one.
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(*v),
			Self::Text(s) => s.trim().parse().ok(),
			_ => None,
		}
	}

	/// Returns the text value, if any.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	/// Returns true if the value is a number, or text that reads as one.
	pub fn is_numeric(&self) -> bool {
		match self {
			Self::Int(_) | Self::Float(_) => true,
			Self::Text(s) => {
				let s = s.trim();
				!s.is_empty() && s.parse::<f64>().is_ok()
			}
			_ => false,
		}
	}

	/// Parses a pivot attribute written inline in a relation spec.
	///
	/// Integers and floats are recognised, everything else stays text.
	pub fn parse_inline(raw: &str) -> Self {
		let raw = raw.trim();
		if let Ok(v) = raw.parse::<i64>() {
			Self::Int(v)
		} else if let Ok(v) = raw.parse::<f64>() {
			Self::Float(v)
		} else {
			Self::Text(raw.to_string())
		}
	}

	/// Converts a JSON scalar. Arrays and objects are rejected.
	pub fn from_json(value: &serde_json::Value) -> Option<Self> {
		match value {
			serde_json::Value::Null => Some(Self::Null),
			serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
			serde_json::Value::Number(n) => n
				.as_i64()
				.map(Self::Int)
				.or_else(|| n.as_f64().map(Self::Float)),
			serde_json::Value::String(s) => Some(Self::Text(s.clone())),
			serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
		}
	}
}

impl fmt::Display for SqlValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => write!(f, "NULL"),
			Self::Bool(b) => write!(f, "{}", b),
			Self::Int(v) => write!(f, "{}", v),
			Self::Float(v) => write!(f, "{}", v),
			Self::Text(s) => write!(f, "{}", s),
			Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
		}
	}
}

impl From<&str> for SqlValue {
	fn from(s: &str) -> Self {
		SqlValue::Text(s.to_string())
	}
}

impl From<String> for SqlValue {
	fn from(s: String) -> Self {
		SqlValue::Text(s)
	}
}

impl From<i64> for SqlValue {
	fn from(i: i64) -> Self {
		SqlValue::Int(i)
	}
}

impl From<i32> for SqlValue {
	fn from(i: i32) -> Self {
		SqlValue::Int(i64::from(i))
	}
}

impl From<f64> for SqlValue {
	fn from(f: f64) -> Self {
		SqlValue::Float(f)
	}
}

impl From<bool> for SqlValue {
	fn from(b: bool) -> Self {
		SqlValue::Bool(b)
	}
}

impl From<DateTime<Utc>> for SqlValue {
	fn from(ts: DateTime<Utc>) -> Self {
		SqlValue::Timestamp(ts)
	}
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(SqlValue::Null, Into::into)
	}
}

/// What a computed value gets to look at while it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct ComputeContext<'a> {
	/// The record built so far. Columns declared earlier in the fixture are already set.
	pub record: &'a Record,
	/// The fixture's raw columns. Only the standard driver provides them.
	pub columns: Option<&'a ColumnMap>,
}

type ComputeFn = dyn Fn(&ComputeContext<'_>) -> FixtureValue + Send + Sync;

/// A deferred column value, evaluated when its record is built.
#[derive(Clone)]
pub struct Computed(Arc<ComputeFn>);

impl Computed {
	/// Wraps a closure.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&ComputeContext<'_>) -> FixtureValue + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// Evaluates the computation.
	pub fn evaluate(&self, context: &ComputeContext<'_>) -> FixtureValue {
		(self.0)(context)
	}
}

impl fmt::Debug for Computed {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Computed(..)")
	}
}

/// A raw column value of a fixture.
#[derive(Debug, Clone)]
pub enum FixtureValue {
	/// A plain value, or a single relation target label.
	Scalar(SqlValue),
	/// Relation target labels, in order.
	List(Vec<String>),
	/// Relation target labels mapped to extra join-row attributes.
	Pivot(IndexMap<String, PivotAttributes>),
	/// A value computed from the record being built.
	Computed(Computed),
}

impl FixtureValue {
	/// Creates a computed value.
	///
	/// # Example
	///
	/// ```
	/// use reinhardt_fixtures::value::{FixtureValue, SqlValue};
	///
	/// let title = FixtureValue::computed(|ctx| {
	///     let name = ctx.record.get("name").map(SqlValue::to_string).unwrap_or_default();
	///     format!("{} the Pirate!", name).into()
	/// });
	/// assert!(title.is_computed());
	/// ```
	pub fn computed<F>(f: F) -> Self
	where
		F: Fn(&ComputeContext<'_>) -> FixtureValue + Send + Sync + 'static,
	{
		Self::Computed(Computed::new(f))
	}

	/// Creates a pivot-bearing relation reference.
	pub fn pivot<I, L, A>(targets: I) -> Self
	where
		I: IntoIterator<Item = (L, A)>,
		L: Into<String>,
		A: IntoIterator<Item = (&'static str, SqlValue)>,
	{
		Self::Pivot(
			targets
				.into_iter()
				.map(|(label, attributes)| {
					let attributes = attributes
						.into_iter()
						.map(|(column, value)| (column.to_string(), value))
						.collect();
					(label.into(), attributes)
				})
				.collect(),
		)
	}

	/// Returns true for [`FixtureValue::Computed`].
	pub fn is_computed(&self) -> bool {
		matches!(self, Self::Computed(_))
	}

	/// Returns the scalar value, if this is one.
	pub fn as_scalar(&self) -> Option<&SqlValue> {
		match self {
			Self::Scalar(v) => Some(v),
			_ => None,
		}
	}

	/// Short name of the variant, for error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Scalar(_) => "scalar",
			Self::List(_) => "list",
			Self::Pivot(_) => "pivot mapping",
			Self::Computed(_) => "computed value",
		}
	}

	/// Classifies a parsed JSON value.
	///
	/// Scalars stay scalars, arrays must hold strings, and objects must map
	/// labels to objects of scalars (or to null for no attributes).
	pub fn from_json(value: serde_json::Value) -> Result<Self, String> {
		match value {
			serde_json::Value::Array(items) => items
				.into_iter()
				.map(|item| match item {
					serde_json::Value::String(label) => Ok(label),
					other => Err(format!("relation labels must be strings, found {}", other)),
				})
				.collect::<Result<Vec<_>, _>>()
				.map(Self::List),
			serde_json::Value::Object(targets) => {
				let mut pivot = IndexMap::with_capacity(targets.len());
				for (label, attributes) in targets {
					let attributes = match attributes {
						serde_json::Value::Null => PivotAttributes::new(),
						serde_json::Value::Object(map) => map
							.into_iter()
							.map(|(column, value)| {
								SqlValue::from_json(&value)
									.map(|v| (column.clone(), v))
									.ok_or_else(|| {
										format!("pivot attribute {} of {} must be a scalar", column, label)
									})
							})
							.collect::<Result<PivotAttributes, _>>()?,
						other => {
							return Err(format!(
								"pivot attributes of {} must be an object, found {}",
								label, other
							));
						}
					};
					pivot.insert(label, attributes);
				}
				Ok(Self::Pivot(pivot))
			}
			scalar => SqlValue::from_json(&scalar)
				.map(Self::Scalar)
				.ok_or_else(|| "unsupported value".to_string()),
		}
	}
}

macro_rules! scalar_from {
	($($ty:ty),*) => {
		$(impl From<$ty> for FixtureValue {
			fn from(value: $ty) -> Self {
				FixtureValue::Scalar(value.into())
			}
		})*
	};
}

scalar_from!(SqlValue, &str, String, i64, i32, f64, bool, DateTime<Utc>);

impl From<Vec<&str>> for FixtureValue {
	fn from(labels: Vec<&str>) -> Self {
		FixtureValue::List(labels.into_iter().map(str::to_string).collect())
	}
}

impl From<Vec<String>> for FixtureValue {
	fn from(labels: Vec<String>) -> Self {
		FixtureValue::List(labels)
	}
}

impl From<Computed> for FixtureValue {
	fn from(computed: Computed) -> Self {
		FixtureValue::Computed(computed)
	}
}

/// Builds a [`ColumnMap`] from `column => value` pairs.
///
/// # Example
///
/// ```
/// use reinhardt_fixtures::columns;
///
/// let columns = columns! {
///     "name" => "Polly",
///     "id" => 4,
/// };
/// assert_eq!(columns.len(), 2);
/// ```
#[macro_export]
macro_rules! columns {
	($($column:expr => $value:expr),* $(,)?) => {{
		let mut columns = $crate::value::ColumnMap::new();
		$(columns.insert(::std::string::String::from($column), $crate::value::FixtureValue::from($value));)*
		columns
	}};
}

/// Builds a [`FixtureSet`] from `label => column map` pairs.
///
/// # Example
///
/// ```
/// use reinhardt_fixtures::{columns, fixture_set};
///
/// let parrots = fixture_set! {
///     "polly" => columns! { "id" => 4, "name" => "Polly" },
///     "george" => columns! { "name" => "George", "pirate" => "blackbeard" },
/// };
/// assert_eq!(parrots.keys().collect::<Vec<_>>(), ["polly", "george"]);
/// ```
#[macro_export]
macro_rules! fixture_set {
	($($label:expr => $columns:expr),* $(,)?) => {{
		let mut set = $crate::value::FixtureSet::new();
		$(set.insert(::std::string::String::from($label), $columns);)*
		set
	}};
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_scalar_conversions() {
		assert_eq!(SqlValue::from("a"), SqlValue::Text("a".to_string()));
		assert_eq!(SqlValue::from(3), SqlValue::Int(3));
		assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
		assert!(matches!(FixtureValue::from(true), FixtureValue::Scalar(SqlValue::Bool(true))));
	}

	#[rstest]
	#[case(SqlValue::Int(1), true)]
	#[case(SqlValue::Float(1.5), true)]
	#[case(SqlValue::Text("42".to_string()), true)]
	#[case(SqlValue::Text(" 4.2 ".to_string()), true)]
	#[case(SqlValue::Text("blackbeard".to_string()), false)]
	#[case(SqlValue::Text(String::new()), false)]
	#[case(SqlValue::Null, false)]
	fn test_is_numeric(#[case] value: SqlValue, #[case] expected: bool) {
		assert_eq!(value.is_numeric(), expected);
	}

	#[rstest]
	#[case(SqlValue::Int(4), Some(4))]
	#[case(SqlValue::Text(" 4 ".to_string()), Some(4))]
	#[case(SqlValue::Text("4.5".to_string()), None)]
	#[case(SqlValue::Text("polly".to_string()), None)]
	#[case(SqlValue::Float(4.0), None)]
	fn test_as_integer(#[case] value: SqlValue, #[case] expected: Option<i64>) {
		assert_eq!(value.as_integer(), expected);
	}

	#[rstest]
	fn test_parse_inline() {
		assert_eq!(SqlValue::parse_inline("5"), SqlValue::Int(5));
		assert_eq!(SqlValue::parse_inline(" 2.5"), SqlValue::Float(2.5));
		assert_eq!(SqlValue::parse_inline("aft"), SqlValue::Text("aft".to_string()));
	}

	#[rstest]
	fn test_from_json_list() {
		let value = FixtureValue::from_json(json!(["batten", "fishes"])).unwrap();
		match value {
			FixtureValue::List(labels) => assert_eq!(labels, vec!["batten", "fishes"]),
			other => panic!("expected list, got {:?}", other),
		}
	}

	#[rstest]
	fn test_from_json_list_rejects_non_strings() {
		let result = FixtureValue::from_json(json!(["batten", 3]));
		assert!(result.is_err());
	}

	#[rstest]
	fn test_from_json_pivot_keeps_order() {
		let value = FixtureValue::from_json(json!({
			"batten": {"position": 5},
			"fishes": null,
			"blow": {"position": 3, "note": "loud"}
		}))
		.unwrap();
		let FixtureValue::Pivot(targets) = value else {
			panic!("expected pivot");
		};
		assert_eq!(targets.keys().collect::<Vec<_>>(), ["batten", "fishes", "blow"]);
		assert_eq!(targets["batten"]["position"], SqlValue::Int(5));
		assert!(targets["fishes"].is_empty());
		assert_eq!(targets["blow"]["note"], SqlValue::Text("loud".to_string()));
	}

	#[rstest]
	fn test_from_json_pivot_rejects_nested_attributes() {
		let result = FixtureValue::from_json(json!({"batten": {"position": [1, 2]}}));
		assert!(result.is_err());
	}

	#[rstest]
	fn test_columns_macro_keeps_order() {
		let columns = columns! {
			"name" => "Edward Teach",
			"id" => 7,
			"catchphrases" => vec!["batten", "blow"],
		};
		assert_eq!(columns.keys().collect::<Vec<_>>(), ["name", "id", "catchphrases"]);
		assert!(matches!(columns["catchphrases"], FixtureValue::List(_)));
	}
}
