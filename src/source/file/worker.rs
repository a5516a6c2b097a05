/* src/source/file/worker.rs */

use std::ffi::OsString;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use super::super::Listeners;
use crate::snapshot::ConsentSnapshot;

/// Drains raw `notify` events, keeps those that touch `file_name`, and fires
/// one edge per quiet period of `debounce`.
pub(super) async fn process_events(
	mut raw_rx: mpsc::Receiver<notify::Result<notify::Event>>,
	listeners: Arc<Listeners<ConsentSnapshot>>,
	file_name: OsString,
	debounce: Duration,
) {
	let mut pending: Option<Instant> = None;

	let tick_rate = if debounce < Duration::from_millis(50) {
		debounce.max(Duration::from_millis(1))
	} else {
		debounce / 5
	};

	let mut interval = tokio::time::interval(tick_rate);

	loop {
		tokio::select! {
			maybe_event = raw_rx.recv() => {
				match maybe_event {
					Some(Ok(event)) => {
						if !is_relevant(&event, &file_name) {
							continue;
						}
						if debounce.is_zero() {
							listeners.notify_edge();
						} else {
							pending = Some(Instant::now());
						}
					}
					Some(Err(e)) => tracing::error!("Notify error: {:?}", e),
					None => break,
				}
			}
			_ = interval.tick() => {
				if pending.is_some_and(|last_seen| last_seen.elapsed() >= debounce) {
					pending = None;
					tracing::trace!(file = ?file_name, "preference file changed");
					listeners.notify_edge();
				}
			}
		}
	}
}

fn is_relevant(event: &notify::Event, file_name: &OsString) -> bool {
	use notify::EventKind as NK;
	if !matches!(event.kind, NK::Create(_) | NK::Modify(_) | NK::Remove(_)) {
		return false;
	}

	event
		.paths
		.iter()
		.any(|path| path.file_name() == Some(file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use notify::event::{AccessKind, CreateKind, ModifyKind};
	use std::path::PathBuf;

	#[test]
	fn only_events_for_the_file_are_relevant() {
		let name = OsString::from("prefs.json");
		let hit = notify::Event::new(notify::EventKind::Modify(ModifyKind::Any))
			.add_path(PathBuf::from("/tmp/x/prefs.json"));
		let other = notify::Event::new(notify::EventKind::Create(CreateKind::File))
			.add_path(PathBuf::from("/tmp/x/other.json"));
		let access = notify::Event::new(notify::EventKind::Access(AccessKind::Any))
			.add_path(PathBuf::from("/tmp/x/prefs.json"));

		assert!(is_relevant(&hit, &name));
		assert!(!is_relevant(&other, &name));
		assert!(!is_relevant(&access, &name));
	}
}
