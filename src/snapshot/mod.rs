/* src/snapshot/mod.rs */

//!
//! Consent snapshots: the flat `IABTCF_*` view of a preference store.

mod diff;
mod keys;
mod value;

pub use diff::{SnapshotDiff, differs};
pub use keys::*;
pub use value::ConsentValue;

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Literal prefix shared by every TCF consent key.
pub const CONSENT_KEY_PREFIX: &str = "IABTCF_";

/// Returns true if `key` belongs to the TCF consent key space.
pub fn is_consent_key(key: &str) -> bool {
	key.starts_with(CONSENT_KEY_PREFIX)
}

/// An immutable, prefix-filtered view of the consent keys in a store.
///
/// Every key starts with [`CONSENT_KEY_PREFIX`]. Values keep the type they
/// had in the store, so `Int(0)` and `Bool(false)` never compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentSnapshot {
	entries: BTreeMap<String, ConsentValue>,
}

impl ConsentSnapshot {
	/// Creates an empty snapshot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a snapshot from the full key space of a store, keeping only
	/// consent keys.
	pub fn from_entries<I, K>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, ConsentValue)>,
		K: Into<String>,
	{
		let entries = entries
			.into_iter()
			.map(|(key, value)| (key.into(), value))
			.filter(|(key, _)| is_consent_key(key))
			.collect();
		Self { entries }
	}

	/// Gets the value stored under a full key (including the prefix).
	pub fn get(&self, key: &str) -> Option<&ConsentValue> {
		self.entries.get(key)
	}

	/// Returns true if the snapshot holds `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	/// Iterates over keys in lexical order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, ConsentValue> {
		self.entries.iter()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Computes which keys differ between `self` and a newer snapshot.
	pub fn diff(&self, newer: &ConsentSnapshot) -> SnapshotDiff {
		SnapshotDiff::between(self, newer)
	}

	/// Consumes the snapshot, returning the underlying map.
	pub fn into_inner(self) -> BTreeMap<String, ConsentValue> {
		self.entries
	}
}

impl<K: Into<String>> FromIterator<(K, ConsentValue)> for ConsentSnapshot {
	fn from_iter<I: IntoIterator<Item = (K, ConsentValue)>>(iter: I) -> Self {
		Self::from_entries(iter)
	}
}

impl<'a> IntoIterator for &'a ConsentSnapshot {
	type Item = (&'a String, &'a ConsentValue);
	type IntoIter = btree_map::Iter<'a, String, ConsentValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_entries_keeps_only_consent_keys() {
		let snapshot = ConsentSnapshot::from_entries([
			("IABTCF_CmpSdkID", ConsentValue::Int(0)),
			("IABTCF_gdprApplies", ConsentValue::Bool(true)),
			("OTHER_KEY", ConsentValue::Text("x".into())),
			("iabtcf_lowercase", ConsentValue::Int(1)),
			("IABTCF", ConsentValue::Int(1)),
		]);

		assert_eq!(snapshot.len(), 2);
		assert_eq!(snapshot.get("IABTCF_CmpSdkID"), Some(&ConsentValue::Int(0)));
		assert_eq!(
			snapshot.get("IABTCF_gdprApplies"),
			Some(&ConsentValue::Bool(true))
		);
		assert!(!snapshot.contains_key("OTHER_KEY"));
	}

	#[test]
	fn equality_ignores_insertion_order() {
		let a = ConsentSnapshot::from_entries([
			("IABTCF_CmpSdkID", ConsentValue::Int(0)),
			("IABTCF_PolicyVersion", ConsentValue::Int(2)),
		]);
		let b = ConsentSnapshot::from_entries([
			("IABTCF_PolicyVersion", ConsentValue::Int(2)),
			("IABTCF_CmpSdkID", ConsentValue::Int(0)),
		]);
		assert_eq!(a, b);
	}

	#[test]
	fn equality_is_type_sensitive() {
		let int_zero = ConsentSnapshot::from_entries([("IABTCF_gdprApplies", ConsentValue::Int(0))]);
		let bool_false =
			ConsentSnapshot::from_entries([("IABTCF_gdprApplies", ConsentValue::Bool(false))]);
		assert_ne!(int_zero, bool_false);
	}

	#[test]
	fn serializes_as_flat_map() {
		let snapshot = ConsentSnapshot::from_entries([
			("IABTCF_CmpSdkID", ConsentValue::Int(7)),
			("IABTCF_TCString", ConsentValue::Text("abc".into())),
		]);
		let json = serde_json::to_value(&snapshot).unwrap();
		assert_eq!(
			json,
			serde_json::json!({ "IABTCF_CmpSdkID": 7, "IABTCF_TCString": "abc" })
		);
	}
}
