/* src/cmp/bridge.rs */

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde_json::Value;

use super::{CmpCallback, CmpError, Command, TCF_API_VERSION, TcData, TcfApi, validate_request};
use crate::source::{Change, ChangeSink, ConsentSource, ListenerId, Result, SourceError};

/// One `addEventListener` registration with the vendor.
struct Registration {
	active: AtomicBool,
	/// The `listenerId` the CMP attached to its first push.
	vendor_id: OnceLock<i64>,
}

/// Adapts a `__tcfapi` implementation to a [`ConsentSource`].
///
/// The CMP has no readable store, so [`read`](ConsentSource::read) yields
/// nothing and every callback invocation becomes a [`Change::Push`],
/// whether or not the CMP flagged it as final.
pub struct CmpBridge<A> {
	api: A,
	registrations: Mutex<HashMap<ListenerId, Arc<Registration>>>,
	next_id: AtomicU64,
}

impl<A: TcfApi> CmpBridge<A> {
	pub fn new(api: A) -> Self {
		Self {
			api,
			registrations: Mutex::new(HashMap::new()),
			next_id: AtomicU64::new(0),
		}
	}

	/// The wrapped vendor object.
	pub fn api(&self) -> &A {
		&self.api
	}

	/// Validates and forwards a raw `__tcfapi` call.
	///
	/// Violations are reported before the vendor is reached, so a lenient
	/// CMP cannot hide a broken integration.
	pub fn call(
		&self,
		command: &str,
		version: i64,
		callback: Option<CmpCallback>,
		parameter: Option<Value>,
	) -> std::result::Result<(), CmpError> {
		validate_request(command, version, callback.is_some(), parameter.as_ref())?;
		self.api.tcfapi(command, version, callback, parameter)
	}

	/// Number of live registrations.
	pub fn listener_count(&self) -> usize {
		self.lock().len()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<ListenerId, Arc<Registration>>> {
		self.registrations.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

fn forwarding_callback(
	id: ListenerId,
	registration: Arc<Registration>,
	sink: ChangeSink<TcData>,
) -> CmpCallback {
	Arc::new(move |data: Value, success: bool| {
		if !registration.active.load(Ordering::SeqCst) {
			tracing::trace!(listener = %id, "dropping CMP push for removed listener");
			return;
		}

		// Recorded before decoding so a malformed push can still be removed.
		if let Some(vendor_id) = data.get("listenerId").and_then(Value::as_i64) {
			let _ = registration.vendor_id.set(vendor_id);
		}

		match TcData::from_value(data) {
			Ok(tc_data) => {
				tracing::trace!(
					listener = %id,
					success,
					event_status = ?tc_data.event_status,
					"CMP pushed TC data"
				);
				sink(Change::Push(tc_data));
			}
			Err(e) => {
				tracing::error!(listener = %id, error = %e, "CMP pushed malformed TC data");
				sink(Change::Fault(SourceError::Cmp(CmpError::MalformedData(e.to_string()))));
			}
		}
	})
}

impl<A: TcfApi> ConsentSource for CmpBridge<A> {
	type Snapshot = TcData;

	fn read(&self) -> Result<Option<TcData>> {
		Ok(None)
	}

	fn subscribe(&self, sink: ChangeSink<TcData>) -> Result<ListenerId> {
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
		let registration = Arc::new(Registration {
			active: AtomicBool::new(true),
			vendor_id: OnceLock::new(),
		});
		self.lock().insert(id, Arc::clone(&registration));

		let callback = forwarding_callback(id, Arc::clone(&registration), sink);
		if let Err(e) = self.call(
			Command::AddEventListener.as_str(),
			TCF_API_VERSION,
			Some(callback),
			None,
		) {
			registration.active.store(false, Ordering::SeqCst);
			self.lock().remove(&id);
			return Err(e.into());
		}

		tracing::debug!(listener = %id, vendor_id = ?registration.vendor_id.get(), "added CMP event listener");
		Ok(id)
	}

	fn unsubscribe(&self, id: ListenerId) -> Result<()> {
		let Some(registration) = self.lock().remove(&id) else {
			return Ok(());
		};
		registration.active.store(false, Ordering::SeqCst);

		let Some(&vendor_id) = registration.vendor_id.get() else {
			tracing::warn!(listener = %id, "CMP never reported a listenerId; its pushes are dropped locally");
			return Ok(());
		};

		let ack: CmpCallback = Arc::new(move |data: Value, _success: bool| {
			if data.as_bool() == Some(true) {
				tracing::debug!(vendor_id, "CMP acknowledged listener removal");
			} else {
				tracing::warn!(vendor_id, response = %data, "CMP did not acknowledge listener removal");
			}
		});

		self.call(
			Command::RemoveEventListener.as_str(),
			TCF_API_VERSION,
			Some(ack),
			Some(Value::from(vendor_id)),
		)?;
		Ok(())
	}
}

impl<A> std::fmt::Debug for CmpBridge<A> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CmpBridge").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cmp::MockCmp;

	fn recorder() -> (ChangeSink<TcData>, Arc<Mutex<Vec<Change<TcData>>>>) {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink_seen = Arc::clone(&seen);
		let sink: ChangeSink<TcData> = Arc::new(move |change: Change<TcData>| sink_seen.lock().unwrap().push(change));
		(sink, seen)
	}

	#[test]
	fn read_yields_nothing() {
		let bridge = CmpBridge::new(MockCmp::new());
		assert!(bridge.read().unwrap().is_none());
	}

	#[test]
	fn subscribe_forwards_synchronous_push() {
		let bridge = CmpBridge::new(MockCmp::new());
		let (sink, seen) = recorder();

		bridge.subscribe(sink).unwrap();

		let seen = seen.lock().unwrap();
		assert_eq!(seen.len(), 1);
		match &seen[0] {
			Change::Push(data) => {
				assert_eq!(data.tcf_policy_version, Some(2));
				assert_eq!(data.purpose_consent(2), Some(true));
			}
			other => panic!("expected push, got {other:?}"),
		}
	}

	#[test]
	fn unsubscribe_removes_vendor_listener_and_silences_pushes() {
		let bridge = CmpBridge::new(Arc::new(MockCmp::new()));
		let (sink, seen) = recorder();

		let id = bridge.subscribe(sink).unwrap();
		assert_eq!(bridge.api().listener_count(), 1);

		bridge.unsubscribe(id).unwrap();
		assert_eq!(bridge.api().listener_count(), 0);
		assert_eq!(bridge.listener_count(), 0);

		bridge.api().push(MockCmp::test_tc_data(), true);
		assert_eq!(seen.lock().unwrap().len(), 1);

		bridge.unsubscribe(id).unwrap();
	}

	#[test]
	fn raw_calls_fail_fast() {
		let bridge = CmpBridge::new(MockCmp::new());
		let noop: CmpCallback = Arc::new(|_: Value, _: bool| {});

		assert_eq!(
			bridge.call("addEventListener", 1, Some(noop.clone()), None),
			Err(CmpError::UnsupportedVersion(1))
		);
		assert_eq!(
			bridge.call("foo", 2, Some(noop.clone()), None),
			Err(CmpError::UnsupportedCommand("foo".into()))
		);
		assert!(matches!(
			bridge.call("removeEventListener", 2, Some(noop), Some(Value::from("1"))),
			Err(CmpError::InvalidListenerId(_))
		));
		assert_eq!(
			bridge.call("addEventListener", 2, None, None),
			Err(CmpError::MissingCallback)
		);
	}

	#[test]
	fn malformed_push_becomes_fault() {
		let bridge = CmpBridge::new(MockCmp::with_data(Value::from("not an object")));
		let (sink, seen) = recorder();

		bridge.subscribe(sink).unwrap();

		let seen = seen.lock().unwrap();
		assert!(matches!(
			seen.as_slice(),
			[Change::Fault(SourceError::Cmp(CmpError::MalformedData(_)))]
		));
	}

	#[test]
	fn malformed_push_still_removes_the_vendor_listener() {
		let bridge = CmpBridge::new(MockCmp::with_data(serde_json::json!({ "cmpId": "ten" })));
		let (sink, seen) = recorder();

		let id = bridge.subscribe(sink).unwrap();
		assert_eq!(bridge.api().listener_count(), 1);
		assert_eq!(seen.lock().unwrap().len(), 1);

		bridge.unsubscribe(id).unwrap();
		assert_eq!(bridge.api().listener_count(), 0);
	}
}
