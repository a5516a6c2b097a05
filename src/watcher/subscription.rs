/* src/watcher/subscription.rs */

use tokio::sync::mpsc::UnboundedSender;

use super::WatchError;
use crate::snapshot::differs;
use crate::source::ListenerId;

/// Outcome of offering a candidate snapshot to the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
	Delivered,
	Suppressed,
	/// The subscriber dropped its stream.
	Closed,
}

/// The single active observer of a watcher.
pub(crate) struct Subscription<T> {
	pub(crate) generation: u64,
	pub(crate) listener: Option<ListenerId>,
	last_sent: Option<T>,
	events: UnboundedSender<Result<T, WatchError>>,
}

impl<T: Clone + PartialEq> Subscription<T> {
	pub(crate) fn new(generation: u64, events: UnboundedSender<Result<T, WatchError>>) -> Self {
		Self {
			generation,
			listener: None,
			last_sent: None,
			events,
		}
	}

	/// Forwards `candidate` unless it equals the last delivered snapshot.
	pub(crate) fn offer(&mut self, candidate: T) -> Delivery {
		if !differs(self.last_sent.as_ref(), &candidate) {
			return Delivery::Suppressed;
		}

		match self.events.send(Ok(candidate.clone())) {
			Ok(()) => {
				self.last_sent = Some(candidate);
				Delivery::Delivered
			}
			Err(_) => Delivery::Closed,
		}
	}

	/// Forwards an error without touching the comparison baseline.
	pub(crate) fn fail(&mut self, error: WatchError) -> Delivery {
		match self.events.send(Err(error)) {
			Ok(()) => Delivery::Delivered,
			Err(_) => Delivery::Closed,
		}
	}

	pub(crate) fn last_sent(&self) -> Option<&T> {
		self.last_sent.as_ref()
	}
}
