/* src/cmp/data.rs */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-id consent and legitimate interest flags, keyed by the decimal id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsentVectors {
	pub consents: BTreeMap<String, bool>,
	pub legitimate_interests: BTreeMap<String, bool>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl ConsentVectors {
	pub fn consent(&self, id: u32) -> Option<bool> {
		self.consents.get(&id.to_string()).copied()
	}

	pub fn legitimate_interest(&self, id: u32) -> Option<bool> {
		self.legitimate_interests.get(&id.to_string()).copied()
	}
}

/// The TCF data object a CMP hands to `addEventListener` callbacks.
///
/// Known fields are typed; anything else is kept in `extra`, so equality
/// covers the whole vendor object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcData {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tc_string: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tcf_policy_version: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cmp_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cmp_version: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gdpr_applies: Option<bool>,
	/// `tcloaded`, `cmpuishown` or `useractioncomplete`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_status: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cmp_status: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub listener_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_service_specific: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub use_non_standard_texts: Option<bool>,
	#[serde(rename = "publisherCC", default, skip_serializing_if = "Option::is_none")]
	pub publisher_cc: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub purpose_one_treatment: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub purpose: Option<ConsentVectors>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vendor: Option<ConsentVectors>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub special_feature_optins: Option<BTreeMap<String, bool>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub publisher: Option<Value>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl TcData {
	/// Decodes a vendor data object.
	pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
		serde_json::from_value(value)
	}

	pub fn purpose_consent(&self, id: u32) -> Option<bool> {
		self.purpose.as_ref()?.consent(id)
	}

	pub fn purpose_legitimate_interest(&self, id: u32) -> Option<bool> {
		self.purpose.as_ref()?.legitimate_interest(id)
	}

	pub fn vendor_consent(&self, id: u32) -> Option<bool> {
		self.vendor.as_ref()?.consent(id)
	}

	/// True once the user has acted or a stored TC string was loaded.
	pub fn is_settled(&self) -> bool {
		matches!(
			self.event_status.as_deref(),
			Some("tcloaded" | "useractioncomplete")
		)
	}
}
