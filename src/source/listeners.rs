/* src/source/listeners.rs */

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Change, ChangeSink, ListenerId};

/// Registry of change sinks shared by source implementations.
pub struct Listeners<T> {
	sinks: Mutex<BTreeMap<ListenerId, ChangeSink<T>>>,
	next_id: AtomicU64,
}

impl<T> Listeners<T> {
	pub fn new() -> Self {
		Self {
			sinks: Mutex::new(BTreeMap::new()),
			next_id: AtomicU64::new(0),
		}
	}

	/// Registers a sink and returns its id.
	pub fn add(&self, sink: ChangeSink<T>) -> ListenerId {
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
		self.lock().insert(id, sink);
		id
	}

	/// Removes a sink. Returns false if the id was not registered.
	pub fn remove(&self, id: ListenerId) -> bool {
		self.lock().remove(&id).is_some()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	/// Sends an edge to every registered sink.
	///
	/// Sinks are collected before the first call, so a sink may add or remove
	/// registrations while being notified.
	pub fn notify_edge(&self) {
		let sinks: Vec<ChangeSink<T>> = self.lock().values().cloned().collect();
		for sink in sinks {
			sink(Change::Edge);
		}
	}

	fn lock(&self) -> MutexGuard<'_, BTreeMap<ListenerId, ChangeSink<T>>> {
		self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl<T> Default for Listeners<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> std::fmt::Debug for Listeners<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Listeners")
			.field("len", &self.len())
			.finish_non_exhaustive()
	}
}
