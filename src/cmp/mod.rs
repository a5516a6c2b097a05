/* src/cmp/mod.rs */

//!
//! Web CMP integration through the IAB `__tcfapi` contract.
//!
//! The vendor object is modelled by [`TcfApi`]; [`CmpBridge`] adapts it to a
//! [`ConsentSource`](crate::source::ConsentSource) so the watcher handles web
//! consent the same way it handles preference stores.

mod bridge;
mod data;
mod error;
mod mock;

pub use bridge::CmpBridge;
pub use data::{ConsentVectors, TcData};
pub use error::CmpError;
pub use mock::MockCmp;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

/// The only `__tcfapi` version this crate speaks.
pub const TCF_API_VERSION: i64 = 2;

/// Callback passed to `__tcfapi`: `(data, success)`.
pub type CmpCallback = Arc<dyn Fn(Value, bool) + Send + Sync>;

/// The vendor-supplied `__tcfapi(command, version, callback, parameter)`.
///
/// `callback` is optional only so that a missing callable can be reported
/// as a protocol violation instead of being unrepresentable.
pub trait TcfApi: Send + Sync + 'static {
	fn tcfapi(
		&self,
		command: &str,
		version: i64,
		callback: Option<CmpCallback>,
		parameter: Option<Value>,
	) -> Result<(), CmpError>;
}

impl<A: TcfApi> TcfApi for Arc<A> {
	fn tcfapi(
		&self,
		command: &str,
		version: i64,
		callback: Option<CmpCallback>,
		parameter: Option<Value>,
	) -> Result<(), CmpError> {
		(**self).tcfapi(command, version, callback, parameter)
	}
}

/// Commands understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
	AddEventListener,
	RemoveEventListener,
}

impl Command {
	/// The literal wire name.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::AddEventListener => "addEventListener",
			Self::RemoveEventListener => "removeEventListener",
		}
	}
}

impl FromStr for Command {
	type Err = CmpError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"addEventListener" => Ok(Self::AddEventListener),
			"removeEventListener" => Ok(Self::RemoveEventListener),
			other => Err(CmpError::UnsupportedCommand(other.to_string())),
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A validated `__tcfapi` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
	AddEventListener,
	RemoveEventListener { listener_id: i64 },
}

/// Checks a `__tcfapi` call against the contract.
///
/// Checks run in the order version, callback, command, parameter.
pub fn validate_request(
	command: &str,
	version: i64,
	has_callback: bool,
	parameter: Option<&Value>,
) -> Result<Request, CmpError> {
	if version != TCF_API_VERSION {
		return Err(CmpError::UnsupportedVersion(version));
	}

	if !has_callback {
		return Err(CmpError::MissingCallback);
	}

	match command.parse::<Command>()? {
		Command::AddEventListener => Ok(Request::AddEventListener),
		Command::RemoveEventListener => {
			let listener_id = parameter
				.and_then(Value::as_i64)
				.ok_or_else(|| CmpError::InvalidListenerId(parameter.cloned().unwrap_or(Value::Null)))?;
			Ok(Request::RemoveEventListener { listener_id })
		}
	}
}
