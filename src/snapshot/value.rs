/* src/snapshot/value.rs */

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

/// A primitive value held by a preference store.
///
/// Serialized untagged, so a JSON `0` is `Int(0)` and `false` is
/// `Bool(false)`; the two never compare equal. Floats compare by bit
/// pattern, so `NaN` equals itself. Integers outside the `i64` range are
/// rejected when deserializing rather than widened to `Float`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ConsentValue {
	/// An explicitly absent value.
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	/// A string set, as Android preferences can hold.
	Strings(Vec<String>),
}

impl ConsentValue {
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Human-readable name of the variant, used in log fields.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::Text(_) => "text",
			Self::Strings(_) => "strings",
		}
	}
}

impl PartialEq for ConsentValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Strings(a), Self::Strings(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for ConsentValue {}

struct ConsentValueVisitor;

impl<'de> Visitor<'de> for ConsentValueVisitor {
	type Value = ConsentValue;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("null, a boolean, a number, a string or a list of strings")
	}

	fn visit_unit<E: de::Error>(self) -> Result<ConsentValue, E> {
		Ok(ConsentValue::Null)
	}

	fn visit_none<E: de::Error>(self) -> Result<ConsentValue, E> {
		Ok(ConsentValue::Null)
	}

	fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<ConsentValue, D::Error> {
		deserializer.deserialize_any(self)
	}

	fn visit_bool<E: de::Error>(self, v: bool) -> Result<ConsentValue, E> {
		Ok(ConsentValue::Bool(v))
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> Result<ConsentValue, E> {
		Ok(ConsentValue::Int(v))
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<ConsentValue, E> {
		i64::try_from(v)
			.map(ConsentValue::Int)
			.map_err(|_| E::custom(format!("integer {v} is out of range for i64")))
	}

	fn visit_f64<E: de::Error>(self, v: f64) -> Result<ConsentValue, E> {
		Ok(ConsentValue::Float(v))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<ConsentValue, E> {
		Ok(ConsentValue::Text(v.to_string()))
	}

	fn visit_string<E: de::Error>(self, v: String) -> Result<ConsentValue, E> {
		Ok(ConsentValue::Text(v))
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ConsentValue, A::Error> {
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
		while let Some(item) = seq.next_element::<String>()? {
			items.push(item);
		}
		Ok(ConsentValue::Strings(items))
	}
}

impl<'de> Deserialize<'de> for ConsentValue {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_any(ConsentValueVisitor)
	}
}

impl From<bool> for ConsentValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for ConsentValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for ConsentValue {
	fn from(value: i32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<f64> for ConsentValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for ConsentValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for ConsentValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<Vec<String>> for ConsentValue {
	fn from(value: Vec<String>) -> Self {
		Self::Strings(value)
	}
}

impl<T: Into<ConsentValue>> From<Option<T>> for ConsentValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}
