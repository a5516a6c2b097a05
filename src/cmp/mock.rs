/* src/cmp/mock.rs */

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};

use super::{CmpCallback, CmpError, Request, TcfApi, validate_request};

/// An in-process CMP for tests and demos.
///
/// Validates calls like a real `__tcfapi`, answers `addEventListener` with
/// its current data and `success = true` before returning, and can push
/// further updates to every live listener.
pub struct MockCmp {
	data: Mutex<Value>,
	listeners: Mutex<BTreeMap<i64, CmpCallback>>,
	next_id: AtomicI64,
}

impl MockCmp {
	pub fn new() -> Self {
		Self::with_data(Self::test_tc_data())
	}

	pub fn with_data(data: Value) -> Self {
		Self {
			data: Mutex::new(data),
			listeners: Mutex::new(BTreeMap::new()),
			next_id: AtomicI64::new(0),
		}
	}

	/// Sample TC data: policy version 2, GDPR applies, even purposes granted.
	pub fn test_tc_data() -> Value {
		let alternating = || -> Value {
			(1..=10)
				.map(|id| (id.to_string(), Value::Bool(id % 2 == 0)))
				.collect::<serde_json::Map<_, _>>()
				.into()
		};

		json!({
			"listenerId": 0,
			"cmpId": 0,
			"cmpVersion": 0,
			"tcfPolicyVersion": 2,
			"tcString": "tcString",
			"gdprApplies": true,
			"purpose": {
				"consents": alternating(),
				"legitimateInterests": alternating(),
			},
			"publisher": {
				"consents": alternating(),
				"legitimateInterests": alternating(),
			},
		})
	}

	/// Replaces the current data and pushes it to every listener.
	pub fn update(&self, data: Value) {
		*lock(&self.data) = data.clone();
		self.push(data, true);
	}

	/// Pushes `data` to every listener without changing the current data.
	pub fn push(&self, data: Value, success: bool) {
		let listeners: Vec<(i64, CmpCallback)> = lock(&self.listeners)
			.iter()
			.map(|(id, callback)| (*id, callback.clone()))
			.collect();

		for (id, callback) in listeners {
			callback(stamp(data.clone(), id), success);
		}
	}

	pub fn listener_count(&self) -> usize {
		lock(&self.listeners).len()
	}
}

impl Default for MockCmp {
	fn default() -> Self {
		Self::new()
	}
}

impl TcfApi for MockCmp {
	fn tcfapi(
		&self,
		command: &str,
		version: i64,
		callback: Option<CmpCallback>,
		parameter: Option<Value>,
	) -> Result<(), CmpError> {
		let request = validate_request(command, version, callback.is_some(), parameter.as_ref())?;
		let callback = callback.ok_or(CmpError::MissingCallback)?;

		match request {
			Request::AddEventListener => {
				let id = self.next_id.fetch_add(1, Ordering::SeqCst);
				lock(&self.listeners).insert(id, callback.clone());
				let data = lock(&self.data).clone();
				callback(stamp(data, id), true);
			}
			Request::RemoveEventListener { listener_id } => {
				let removed = lock(&self.listeners).remove(&listener_id).is_some();
				callback(Value::Bool(removed), true);
			}
		}

		Ok(())
	}
}

/// Sets `listenerId` on object payloads.
fn stamp(mut data: Value, listener_id: i64) -> Value {
	if let Some(object) = data.as_object_mut() {
		object.insert("listenerId".to_string(), Value::from(listener_id));
	}
	data
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
