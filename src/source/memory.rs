/* src/source/memory.rs */

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{ChangeSink, ConsentSource, ListenerId, Listeners, Result};
use crate::snapshot::{ConsentSnapshot, ConsentValue};

/// An in-memory preference store.
///
/// Holds the whole key space, not only consent keys, and notifies listeners
/// on every write, the way platform preference stores do. Reads are
/// lock-free; writes use RCU.
pub struct MemoryStore {
	inner: ArcSwap<HashMap<String, ConsentValue>>,
	listeners: Listeners<ConsentSnapshot>,
}

impl MemoryStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self {
			inner: ArcSwap::from_pointee(HashMap::new()),
			listeners: Listeners::new(),
		}
	}

	/// Creates a store pre-populated with `entries`.
	pub fn with_entries<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<ConsentValue>,
	{
		let map = entries
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect::<HashMap<_, _>>();
		Self {
			inner: ArcSwap::from_pointee(map),
			listeners: Listeners::new(),
		}
	}

	/// Gets a value by key. This is a wait-free operation.
	pub fn get(&self, key: &str) -> Option<ConsentValue> {
		self.inner.load().get(key).cloned()
	}

	/// Returns all keys in the store, consent or not.
	pub fn keys(&self) -> Vec<String> {
		self.inner.load().keys().cloned().collect()
	}

	/// Returns an atomic copy of the whole key space.
	pub fn entries(&self) -> Arc<HashMap<String, ConsentValue>> {
		self.inner.load_full()
	}

	pub fn len(&self) -> usize {
		self.inner.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.load().is_empty()
	}

	/// Inserts or updates a value, returning the previous one.
	pub fn set(&self, key: impl Into<String>, value: impl Into<ConsentValue>) -> Option<ConsentValue> {
		let key = key.into();
		let value = value.into();
		let previous: RefCell<Option<ConsentValue>> = RefCell::new(None);

		self.inner.rcu(|map| {
			let mut new_map = (**map).clone();
			*previous.borrow_mut() = new_map.insert(key.clone(), value.clone());
			new_map
		});

		tracing::trace!(key = %key, kind = value.kind(), "memory store write");
		self.listeners.notify_edge();
		previous.into_inner()
	}

	/// Removes a key, returning its value.
	pub fn remove(&self, key: &str) -> Option<ConsentValue> {
		let removed: RefCell<Option<ConsentValue>> = RefCell::new(None);

		self.inner.rcu(|map| {
			let mut new_map = (**map).clone();
			*removed.borrow_mut() = new_map.remove(key);
			new_map
		});

		self.listeners.notify_edge();
		removed.into_inner()
	}

	/// Writes several values in one atomic step and notifies once.
	pub fn extend<I, K, V>(&self, entries: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<ConsentValue>,
	{
		let entries: Vec<(String, ConsentValue)> = entries
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();

		self.inner.rcu(|map| {
			let mut new_map = (**map).clone();
			new_map.extend(entries.iter().cloned());
			new_map
		});

		self.listeners.notify_edge();
	}

	/// Atomically replaces the whole key space.
	pub fn replace_all<I, K, V>(&self, entries: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<ConsentValue>,
	{
		let map = entries
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect::<HashMap<_, _>>();
		self.inner.store(Arc::new(map));
		self.listeners.notify_edge();
	}

	/// Removes every key.
	pub fn clear(&self) {
		self.inner.store(Arc::new(HashMap::new()));
		self.listeners.notify_edge();
	}

	/// Number of registered change listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for MemoryStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryStore")
			.field("len", &self.len())
			.field("listeners", &self.listeners)
			.finish()
	}
}

impl ConsentSource for MemoryStore {
	type Snapshot = ConsentSnapshot;

	fn read(&self) -> Result<Option<ConsentSnapshot>> {
		let map = self.inner.load();
		Ok(Some(ConsentSnapshot::from_entries(
			map.iter().map(|(k, v)| (k.clone(), v.clone())),
		)))
	}

	fn subscribe(&self, sink: ChangeSink<ConsentSnapshot>) -> Result<ListenerId> {
		Ok(self.listeners.add(sink))
	}

	fn unsubscribe(&self, id: ListenerId) -> Result<()> {
		self.listeners.remove(id);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::source::Change;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[test]
	fn read_filters_prefix_and_preserves_types() {
		let store = MemoryStore::with_entries([
			("IABTCF_CmpSdkID", ConsentValue::Int(0)),
			("IABTCF_gdprApplies", ConsentValue::Bool(false)),
			("IABTCF_TCString", ConsentValue::Text("abc".into())),
			("OTHER_KEY", ConsentValue::Text("x".into())),
			("flutter.count", ConsentValue::Int(3)),
		]);

		let snapshot = store.read().unwrap().unwrap();
		assert_eq!(snapshot.len(), 3);
		assert_eq!(snapshot.get("IABTCF_CmpSdkID"), Some(&ConsentValue::Int(0)));
		assert_eq!(
			snapshot.get("IABTCF_gdprApplies"),
			Some(&ConsentValue::Bool(false))
		);
		assert!(!snapshot.contains_key("OTHER_KEY"));
		assert_eq!(store.len(), 5);
	}

	#[test]
	fn every_write_fires_an_edge() {
		let store = MemoryStore::new();
		let edges = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&edges);
		let id = store
			.subscribe(Arc::new(move |change: Change<ConsentSnapshot>| {
				assert!(matches!(change, Change::Edge));
				counter.fetch_add(1, Ordering::SeqCst);
			}))
			.unwrap();

		store.set("OTHER_KEY", "x");
		store.set("IABTCF_CmpSdkID", 1);
		store.set("IABTCF_CmpSdkID", 1);
		store.remove("OTHER_KEY");
		store.extend([("a", 1), ("b", 2)]);
		store.clear();
		assert_eq!(edges.load(Ordering::SeqCst), 6);

		store.unsubscribe(id).unwrap();
		store.set("OTHER_KEY", "y");
		assert_eq!(edges.load(Ordering::SeqCst), 6);
		assert_eq!(store.listener_count(), 0);
	}

	#[test]
	fn set_and_remove_return_previous_values() {
		let store = MemoryStore::new();
		assert_eq!(store.set("IABTCF_PolicyVersion", 2), None);
		assert_eq!(
			store.set("IABTCF_PolicyVersion", 4),
			Some(ConsentValue::Int(2))
		);
		assert_eq!(
			store.remove("IABTCF_PolicyVersion"),
			Some(ConsentValue::Int(4))
		);
		assert!(store.get("IABTCF_PolicyVersion").is_none());
	}
}
