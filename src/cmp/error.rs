/* src/cmp/error.rs */

use serde_json::Value;

/// Violations of the `__tcfapi` contract.
///
/// These indicate a broken CMP integration and are never swallowed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CmpError {
	#[error("Unexpected command: {0}")]
	UnsupportedCommand(String),

	#[error("Unexpected version: {0}")]
	UnsupportedVersion(i64),

	#[error("Expected callback but received none")]
	MissingCallback,

	#[error("Expected listenerId, but received: {0}")]
	InvalidListenerId(Value),

	/// The CMP pushed data that is not a TCF data object.
	#[error("malformed TC data: {0}")]
	MalformedData(String),

	/// The CMP itself reported a failure.
	#[error("CMP failure: {0}")]
	Vendor(String),
}
