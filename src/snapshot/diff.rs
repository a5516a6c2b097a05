/* src/snapshot/diff.rs */

use super::ConsentSnapshot;

/// Returns true if `candidate` must be delivered given the last delivered
/// value. Nothing delivered yet always counts as a change.
pub fn differs<T: PartialEq>(last_sent: Option<&T>, candidate: &T) -> bool {
	last_sent.is_none_or(|last| last != candidate)
}

/// Keys that differ between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
	/// Keys present only in the newer snapshot.
	pub added: Vec<String>,
	/// Keys present only in the older snapshot.
	pub removed: Vec<String>,
	/// Keys present in both with a different value or type.
	pub changed: Vec<String>,
}

impl SnapshotDiff {
	pub(crate) fn between(older: &ConsentSnapshot, newer: &ConsentSnapshot) -> Self {
		let mut diff = Self::default();

		for (key, value) in newer {
			match older.get(key) {
				None => diff.added.push(key.clone()),
				Some(old) if old != value => diff.changed.push(key.clone()),
				Some(_) => {}
			}
		}

		for key in older.keys() {
			if !newer.contains_key(key) {
				diff.removed.push(key.to_string());
			}
		}

		diff
	}

	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
	}
}
