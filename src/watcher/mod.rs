/* src/watcher/mod.rs */

//!
//! The consent watcher: a single-subscriber, deduplicating push stream over a
//! [`ConsentSource`].
//!
//! On [`listen`](ConsentWatcher::listen) the source is read once and the
//! result emitted. Every later notification is compared with the last
//! delivered snapshot, and only real changes reach the subscriber. Sources
//! fire on unrelated writes, so most notifications end up suppressed.

mod error;
mod stream;
mod subscription;

pub use error::WatchError;
pub use stream::ConsentStream;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

use crate::source::{Change, ChangeSink, ConsentSource, SourceError};
use stream::Detach;
use subscription::{Delivery, Subscription};

const DEFAULT_LABEL: &str = "consent";

/// Watches a consent source and forwards only snapshots that changed.
///
/// At most one subscription is active at a time. Cancelling (or dropping the
/// stream) returns the watcher to its initial state; a later `listen`
/// behaves exactly like the first.
pub struct ConsentWatcher<S: ConsentSource> {
	inner: Arc<Inner<S>>,
}

struct Inner<S: ConsentSource> {
	source: S,
	label: String,
	state: Mutex<Option<Subscription<S::Snapshot>>>,
	generation: AtomicU64,
}

/// Builder for ConsentWatcher.
pub struct ConsentWatcherBuilder<S> {
	source: Option<S>,
	label: Option<String>,
}

impl<S: ConsentSource> ConsentWatcherBuilder<S> {
	pub fn new() -> Self {
		Self {
			source: None,
			label: None,
		}
	}

	pub fn source(mut self, source: S) -> Self {
		self.source = Some(source);
		self
	}

	/// Name used in log fields.
	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn build(self) -> Result<ConsentWatcher<S>, WatchError> {
		let source = self
			.source
			.ok_or_else(|| WatchError::Builder("source is required".to_string()))?;
		let label = self.label.unwrap_or_else(|| DEFAULT_LABEL.to_string());
		if label.is_empty() {
			return Err(WatchError::Builder("label must not be empty".to_string()));
		}
		Ok(ConsentWatcher::from_parts(source, label))
	}
}

impl<S: ConsentSource> Default for ConsentWatcherBuilder<S> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: ConsentSource> ConsentWatcher<S> {
	pub fn new(source: S) -> Self {
		Self::from_parts(source, DEFAULT_LABEL.to_string())
	}

	pub fn builder() -> ConsentWatcherBuilder<S> {
		ConsentWatcherBuilder::new()
	}

	fn from_parts(source: S, label: String) -> Self {
		Self {
			inner: Arc::new(Inner {
				source,
				label,
				state: Mutex::new(None),
				generation: AtomicU64::new(0),
			}),
		}
	}

	pub fn source(&self) -> &S {
		&self.inner.source
	}

	pub fn label(&self) -> &str {
		&self.inner.label
	}

	/// Reads the source once, outside any subscription.
	pub fn snapshot(&self) -> Result<Option<S::Snapshot>, WatchError> {
		Ok(self.inner.source.read()?)
	}

	/// Returns true while a subscription is active.
	pub fn is_listening(&self) -> bool {
		self.inner.lock().is_some()
	}

	/// The last snapshot delivered to the active subscriber.
	pub fn last_sent(&self) -> Option<S::Snapshot> {
		self.inner.lock().as_ref().and_then(|s| s.last_sent().cloned())
	}

	/// Starts observing the source.
	///
	/// Reads the source synchronously and emits the result as the first
	/// item, then registers for change notifications. A read error is
	/// returned as is. Fails with [`WatchError::AlreadyListening`] if a
	/// subscription is already active; that subscription is left untouched.
	pub fn listen(&self) -> Result<ConsentStream<S::Snapshot>, WatchError> {
		let inner = &self.inner;
		let (tx, rx) = mpsc::unbounded_channel();

		let generation = {
			let mut state = inner.lock();
			if state.is_some() {
				tracing::warn!(label = %inner.label, "listen called while a subscription is active");
				return Err(WatchError::AlreadyListening);
			}

			let initial = inner.source.read()?;
			let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
			let mut subscription = Subscription::new(generation, tx);
			if let Some(snapshot) = initial {
				subscription.offer(snapshot);
			}
			*state = Some(subscription);
			generation
		};

		// Sources may notify from inside `subscribe`, so no lock is held here.
		let listener = match inner.source.subscribe(inner.sink(generation)) {
			Ok(listener) => listener,
			Err(e) => {
				let mut state = inner.lock();
				if state.as_ref().is_some_and(|s| s.generation == generation) {
					*state = None;
				}
				tracing::error!(label = %inner.label, error = %e, "failed to register for consent changes");
				return Err(e.into());
			}
		};

		let registered = {
			let mut state = inner.lock();
			match state.as_mut() {
				Some(subscription) if subscription.generation == generation => {
					subscription.listener = Some(listener);
					true
				}
				_ => false,
			}
		};

		if !registered {
			// Torn down while registering: a fault, a cancel, or a dropped stream.
			if let Err(e) = inner.source.unsubscribe(listener) {
				tracing::warn!(label = %inner.label, error = %e, "failed to unregister stale listener");
			}
		}

		tracing::debug!(label = %inner.label, generation, listener = %listener, "listening for consent changes");

		let owner: Weak<dyn Detach> = Arc::<Inner<S>>::downgrade(&self.inner);
		Ok(ConsentStream::new(rx, owner, generation))
	}

	/// Stops observing the source.
	///
	/// Once this returns no further item is emitted, even for a notification
	/// already in flight. Without an active subscription this is a no-op.
	pub fn cancel(&self) -> Result<(), WatchError> {
		Ok(self.inner.release(None)?)
	}
}

impl<S: ConsentSource> Inner<S> {
	fn lock(&self) -> MutexGuard<'_, Option<Subscription<S::Snapshot>>> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn sink(self: &Arc<Self>, generation: u64) -> ChangeSink<S::Snapshot> {
		let weak = Arc::downgrade(self);
		Arc::new(move |change: Change<S::Snapshot>| {
			if let Some(inner) = weak.upgrade() {
				inner.on_change(generation, change);
			}
		})
	}

	fn on_change(&self, generation: u64, change: Change<S::Snapshot>) {
		let mut state = self.lock();
		let Some(subscription) = state.as_mut().filter(|s| s.generation == generation) else {
			tracing::trace!(label = %self.label, generation, "ignoring change for inactive subscription");
			return;
		};

		let mut fatal = false;
		let delivery = match change {
			Change::Edge => match self.source.read() {
				Ok(Some(snapshot)) => subscription.offer(snapshot),
				Ok(None) => Delivery::Suppressed,
				Err(e) => {
					tracing::warn!(label = %self.label, error = %e, "failed to re-read consent source");
					subscription.fail(e.into())
				}
			},
			Change::Push(snapshot) => subscription.offer(snapshot),
			Change::Fault(e) => {
				tracing::error!(label = %self.label, error = %e, "consent source reported a protocol violation");
				fatal = true;
				subscription.fail(e.into())
			}
		};

		match delivery {
			Delivery::Delivered => tracing::debug!(label = %self.label, generation, "delivered consent update"),
			Delivery::Suppressed => tracing::trace!(label = %self.label, generation, "suppressed unchanged snapshot"),
			Delivery::Closed => tracing::debug!(label = %self.label, generation, "subscriber went away"),
		}

		if fatal || delivery == Delivery::Closed {
			let listener = state.take().and_then(|s| s.listener);
			drop(state);
			if let Some(listener) = listener {
				if let Err(e) = self.source.unsubscribe(listener) {
					tracing::warn!(label = %self.label, error = %e, "failed to unregister listener");
				}
			}
		}
	}

	/// Detaches the subscription, then unregisters its listener.
	///
	/// With `Some(generation)` only that subscription is released.
	fn release(&self, generation: Option<u64>) -> Result<(), SourceError> {
		let subscription = {
			let mut state = self.lock();
			let matches = state
				.as_ref()
				.is_some_and(|s| generation.is_none_or(|g| g == s.generation));
			if matches { state.take() } else { None }
		};

		let Some(subscription) = subscription else {
			return Ok(());
		};

		tracing::debug!(label = %self.label, generation = subscription.generation, "cancelled consent subscription");
		if let Some(listener) = subscription.listener {
			self.source.unsubscribe(listener)?;
		}
		Ok(())
	}
}

impl<S: ConsentSource> Detach for Inner<S> {
	fn detach(&self, generation: u64) {
		if let Err(e) = self.release(Some(generation)) {
			tracing::warn!(label = %self.label, error = %e, "failed to release dropped stream");
		}
	}
}

impl<S: ConsentSource> Drop for ConsentWatcher<S> {
	fn drop(&mut self) {
		if let Err(e) = self.inner.release(None) {
			tracing::warn!(label = %self.inner.label, error = %e, "failed to cancel watcher on drop");
		}
	}
}

impl<S> std::fmt::Debug for ConsentWatcher<S>
where
	S: ConsentSource + std::fmt::Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConsentWatcher")
			.field("source", &self.inner.source)
			.field("label", &self.inner.label)
			.field("listening", &self.is_listening())
			.finish()
	}
}
