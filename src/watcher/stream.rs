/* src/watcher/stream.rs */

use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::WatchError;

/// Something a stream can detach from when it is dropped.
pub(crate) trait Detach: Send + Sync {
	fn detach(&self, generation: u64);
}

/// The push stream returned by [`ConsentWatcher::listen`](super::ConsentWatcher::listen).
///
/// Yields snapshots until the watcher is cancelled, or one error followed by
/// the end of the stream when the source reports a protocol violation.
/// Dropping the stream cancels its subscription.
pub struct ConsentStream<T> {
	inner: UnboundedReceiverStream<Result<T, WatchError>>,
	owner: Weak<dyn Detach>,
	generation: u64,
}

impl<T> ConsentStream<T> {
	pub(crate) fn new(
		rx: UnboundedReceiver<Result<T, WatchError>>,
		owner: Weak<dyn Detach>,
		generation: u64,
	) -> Self {
		Self {
			inner: UnboundedReceiverStream::new(rx),
			owner,
			generation,
		}
	}

	/// Generation of the subscription feeding this stream.
	pub fn generation(&self) -> u64 {
		self.generation
	}
}

impl<T> Stream for ConsentStream<T> {
	type Item = Result<T, WatchError>;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		Pin::new(&mut self.inner).poll_next(cx)
	}
}

impl<T> Drop for ConsentStream<T> {
	fn drop(&mut self) {
		if let Some(owner) = self.owner.upgrade() {
			owner.detach(self.generation);
		}
	}
}

impl<T> std::fmt::Debug for ConsentStream<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConsentStream")
			.field("generation", &self.generation)
			.finish_non_exhaustive()
	}
}
