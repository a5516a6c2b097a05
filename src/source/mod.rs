/* src/source/mod.rs */

//!
//! Consent sources: a readable store fused with its change notifier.
//!
//! - [`MemoryStore`] - In-memory preference store (feature `memory`)
//! - [`FileStore`] - Preference file watched on disk (feature `file`)
//! - [`CmpBridge`](crate::cmp::CmpBridge) - Web CMP adapter

mod error;
mod listeners;
#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "file")]
pub mod file;
#[cfg(feature = "file")]
pub mod format;

pub use error::{Result, SourceError};
pub use listeners::Listeners;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "file")]
pub use file::{FileStore, FileStoreBuilder, FileStoreConfig};

use std::fmt;
use std::sync::Arc;

/// Identifies one registration with a source's change notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A notification delivered by a source.
#[derive(Debug)]
pub enum Change<T> {
	/// The store may have changed. Carries no data; the receiver re-reads.
	Edge,
	/// The source pushed a complete candidate snapshot.
	Push(T),
	/// The source detected a protocol violation after registration.
	Fault(SourceError),
}

/// Callback a source invokes for every notification.
pub type ChangeSink<T> = Arc<dyn Fn(Change<T>) + Send + Sync>;

/// A readable consent store together with its change notifier.
///
/// Implementations fire notifications for *any* change they observe; callers
/// are expected to compare snapshots themselves.
pub trait ConsentSource: Send + Sync + 'static {
	/// The snapshot shape this source produces.
	type Snapshot: Clone + PartialEq + fmt::Debug + Send + 'static;

	/// Reads the current snapshot synchronously.
	///
	/// Returns `Ok(None)` for sources that only deliver snapshots by push.
	fn read(&self) -> Result<Option<Self::Snapshot>>;

	/// Registers `sink` to receive change notifications.
	///
	/// Implementations may invoke `sink` before returning.
	fn subscribe(&self, sink: ChangeSink<Self::Snapshot>) -> Result<ListenerId>;

	/// Removes a registration. Unknown ids are ignored.
	fn unsubscribe(&self, id: ListenerId) -> Result<()>;
}

impl<S: ConsentSource> ConsentSource for Arc<S> {
	type Snapshot = S::Snapshot;

	fn read(&self) -> Result<Option<Self::Snapshot>> {
		(**self).read()
	}

	fn subscribe(&self, sink: ChangeSink<Self::Snapshot>) -> Result<ListenerId> {
		(**self).subscribe(sink)
	}

	fn unsubscribe(&self, id: ListenerId) -> Result<()> {
		(**self).unsubscribe(id)
	}
}
