/* src/snapshot/keys.rs */

//!
//! Well-known keys of the TCF v2 in-app storage layout.

use super::{ConsentSnapshot, ConsentValue};

pub const CMP_SDK_ID: &str = "IABTCF_CmpSdkID";
pub const CMP_SDK_VERSION: &str = "IABTCF_CmpSdkVersion";
pub const POLICY_VERSION: &str = "IABTCF_PolicyVersion";
pub const GDPR_APPLIES: &str = "IABTCF_gdprApplies";
pub const PUBLISHER_CC: &str = "IABTCF_PublisherCC";
pub const PURPOSE_ONE_TREATMENT: &str = "IABTCF_PurposeOneTreatment";
pub const USE_NON_STANDARD_TEXTS: &str = "IABTCF_UseNonStandardTexts";
pub const TC_STRING: &str = "IABTCF_TCString";
pub const VENDOR_CONSENTS: &str = "IABTCF_VendorConsents";
pub const VENDOR_LEGITIMATE_INTERESTS: &str = "IABTCF_VendorLegitimateInterests";
pub const PURPOSE_CONSENTS: &str = "IABTCF_PurposeConsents";
pub const PURPOSE_LEGITIMATE_INTERESTS: &str = "IABTCF_PurposeLegitimateInterests";
pub const SPECIAL_FEATURES_OPT_INS: &str = "IABTCF_SpecialFeaturesOptIns";

/// Typed accessors. None of these decode the TC string itself.
impl ConsentSnapshot {
	pub fn cmp_sdk_id(&self) -> Option<i64> {
		self.get(CMP_SDK_ID).and_then(ConsentValue::as_int)
	}

	pub fn cmp_sdk_version(&self) -> Option<i64> {
		self.get(CMP_SDK_VERSION).and_then(ConsentValue::as_int)
	}

	pub fn policy_version(&self) -> Option<i64> {
		self.get(POLICY_VERSION).and_then(ConsentValue::as_int)
	}

	/// Whether GDPR applies. Stores write `1`/`0`; some CMPs write booleans.
	pub fn gdpr_applies(&self) -> Option<bool> {
		self.flag(GDPR_APPLIES)
	}

	pub fn publisher_cc(&self) -> Option<&str> {
		self.get(PUBLISHER_CC).and_then(ConsentValue::as_str)
	}

	pub fn purpose_one_treatment(&self) -> Option<bool> {
		self.flag(PURPOSE_ONE_TREATMENT)
	}

	pub fn use_non_standard_texts(&self) -> Option<bool> {
		self.flag(USE_NON_STANDARD_TEXTS)
	}

	/// The raw TC string, verbatim.
	pub fn tc_string(&self) -> Option<&str> {
		self.get(TC_STRING).and_then(ConsentValue::as_str)
	}

	/// Consent for purpose `id` (1-based) from `IABTCF_PurposeConsents`.
	pub fn purpose_consent(&self, id: usize) -> Option<bool> {
		self.bit(PURPOSE_CONSENTS, id)
	}

	pub fn purpose_legitimate_interest(&self, id: usize) -> Option<bool> {
		self.bit(PURPOSE_LEGITIMATE_INTERESTS, id)
	}

	pub fn vendor_consent(&self, id: usize) -> Option<bool> {
		self.bit(VENDOR_CONSENTS, id)
	}

	pub fn vendor_legitimate_interest(&self, id: usize) -> Option<bool> {
		self.bit(VENDOR_LEGITIMATE_INTERESTS, id)
	}

	pub fn special_feature_opt_in(&self, id: usize) -> Option<bool> {
		self.bit(SPECIAL_FEATURES_OPT_INS, id)
	}

	fn flag(&self, key: &str) -> Option<bool> {
		match self.get(key)? {
			ConsentValue::Bool(b) => Some(*b),
			ConsentValue::Int(1) => Some(true),
			ConsentValue::Int(0) => Some(false),
			_ => None,
		}
	}

	/// Reads position `id - 1` of a `'0'`/`'1'` bit string.
	fn bit(&self, key: &str, id: usize) -> Option<bool> {
		let bits = self.get(key)?.as_str()?;
		match bits.as_bytes().get(id.checked_sub(1)?)? {
			b'1' => Some(true),
			b'0' => Some(false),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> ConsentSnapshot {
		ConsentSnapshot::from_entries([
			(CMP_SDK_ID, ConsentValue::Int(300)),
			(POLICY_VERSION, ConsentValue::Int(2)),
			(GDPR_APPLIES, ConsentValue::Int(1)),
			(PUBLISHER_CC, ConsentValue::Text("DE".into())),
			(PURPOSE_ONE_TREATMENT, ConsentValue::Bool(false)),
			(TC_STRING, ConsentValue::Text("CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA".into())),
			(PURPOSE_CONSENTS, ConsentValue::Text("0101".into())),
			(VENDOR_CONSENTS, ConsentValue::Text("1x".into())),
		])
	}

	#[test]
	fn reads_scalar_keys() {
		let snapshot = sample();
		assert_eq!(snapshot.cmp_sdk_id(), Some(300));
		assert_eq!(snapshot.policy_version(), Some(2));
		assert_eq!(snapshot.cmp_sdk_version(), None);
		assert_eq!(snapshot.gdpr_applies(), Some(true));
		assert_eq!(snapshot.publisher_cc(), Some("DE"));
		assert_eq!(snapshot.purpose_one_treatment(), Some(false));
		assert!(snapshot.tc_string().is_some_and(|s| s.starts_with("CPX")));
	}

	#[test]
	fn reads_bit_strings_one_based() {
		let snapshot = sample();
		assert_eq!(snapshot.purpose_consent(1), Some(false));
		assert_eq!(snapshot.purpose_consent(2), Some(true));
		assert_eq!(snapshot.purpose_consent(4), Some(true));
		assert_eq!(snapshot.purpose_consent(5), None);
		assert_eq!(snapshot.purpose_consent(0), None);
		assert_eq!(snapshot.vendor_consent(1), Some(true));
		assert_eq!(snapshot.vendor_consent(2), None);
		assert_eq!(snapshot.purpose_legitimate_interest(1), None);
	}

	#[test]
	fn flag_rejects_other_integers() {
		let snapshot = ConsentSnapshot::from_entries([(GDPR_APPLIES, ConsentValue::Int(2))]);
		assert_eq!(snapshot.gdpr_applies(), None);
	}
}
