/* src/source/format/mod.rs */

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;

use super::SourceError;
use crate::snapshot::ConsentValue;

mod json;
pub use json::Json;

#[cfg(feature = "toml")]
mod toml;
#[cfg(feature = "toml")]
pub use self::toml::Toml;

#[cfg(feature = "yaml")]
mod yaml;
#[cfg(feature = "yaml")]
pub use yaml::Yaml;

/// Abstract format parser that converts bytes into a structured object.
pub trait Format: Send + Sync {
	/// List of supported extensions.
	fn extensions(&self) -> &'static [&'static str];

	/// Parse the raw bytes into the target type.
	fn parse<T: DeserializeOwned>(&self, input: &[u8]) -> Result<T, SourceError>;
}

/// An enum wrapper for all supported preference file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-config", serde(rename_all = "lowercase"))]
pub enum AnyFormat {
	#[default]
	Json,
	#[cfg(feature = "toml")]
	Toml,
	#[cfg(feature = "yaml")]
	Yaml,
}

impl AnyFormat {
	/// Selects a format from a file extension.
	pub fn from_extension(ext: &str) -> Option<Self> {
		let ext = ext.to_ascii_lowercase();
		Self::all()
			.iter()
			.copied()
			.find(|format| format.extensions().contains(&ext.as_str()))
	}

	/// Selects a format from the extension of `path`.
	pub fn from_path(path: &Path) -> Result<Self, SourceError> {
		let ext = path
			.extension()
			.and_then(|ext| ext.to_str())
			.ok_or_else(|| SourceError::UnsupportedFormat(format!("{}", path.display())))?;
		Self::from_extension(ext).ok_or_else(|| SourceError::UnsupportedFormat(ext.to_string()))
	}

	/// Every format compiled into this build.
	pub fn all() -> &'static [AnyFormat] {
		&[
			Self::Json,
			#[cfg(feature = "toml")]
			Self::Toml,
			#[cfg(feature = "yaml")]
			Self::Yaml,
		]
	}

	/// Parses a flat preference file into its full key space.
	pub fn parse_entries(&self, input: &[u8]) -> Result<BTreeMap<String, ConsentValue>, SourceError> {
		if input.iter().all(u8::is_ascii_whitespace) {
			return Ok(BTreeMap::new());
		}
		self.parse(input)
	}
}

impl Format for AnyFormat {
	fn extensions(&self) -> &'static [&'static str] {
		match self {
			Self::Json => Json.extensions(),
			#[cfg(feature = "toml")]
			Self::Toml => Toml.extensions(),
			#[cfg(feature = "yaml")]
			Self::Yaml => Yaml.extensions(),
		}
	}

	fn parse<T: DeserializeOwned>(&self, input: &[u8]) -> Result<T, SourceError> {
		match self {
			Self::Json => Json.parse(input),
			#[cfg(feature = "toml")]
			Self::Toml => Toml.parse(input),
			#[cfg(feature = "yaml")]
			Self::Yaml => Yaml.parse(input),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selects_format_by_extension() {
		assert_eq!(AnyFormat::from_extension("json"), Some(AnyFormat::Json));
		assert_eq!(AnyFormat::from_extension("JSON"), Some(AnyFormat::Json));
		assert_eq!(AnyFormat::from_extension("xml"), None);
		assert!(matches!(
			AnyFormat::from_path(Path::new("prefs")),
			Err(SourceError::UnsupportedFormat(_))
		));
	}

	#[test]
	fn json_entries_keep_their_types() {
		let entries = AnyFormat::Json
			.parse_entries(br#"{"IABTCF_CmpSdkID": 0, "IABTCF_gdprApplies": false, "other": "x"}"#)
			.unwrap();
		assert_eq!(entries.get("IABTCF_CmpSdkID"), Some(&ConsentValue::Int(0)));
		assert_eq!(
			entries.get("IABTCF_gdprApplies"),
			Some(&ConsentValue::Bool(false))
		);
		assert_eq!(entries.len(), 3);
	}

	#[test]
	fn blank_input_is_an_empty_store() {
		assert!(AnyFormat::Json.parse_entries(b"  \n").unwrap().is_empty());
	}

	#[test]
	fn malformed_input_is_a_parse_error() {
		assert!(matches!(
			AnyFormat::Json.parse_entries(b"{ not json"),
			Err(SourceError::Parse(_))
		));
	}

	#[test]
	fn oversized_integer_is_a_parse_error() {
		assert!(matches!(
			AnyFormat::Json.parse_entries(br#"{"IABTCF_CmpSdkID": 18446744073709551615}"#),
			Err(SourceError::Parse(_))
		));
	}

	#[cfg(feature = "toml")]
	#[test]
	fn toml_entries() {
		let entries = AnyFormat::Toml
			.parse_entries(b"IABTCF_CmpSdkID = 3\nIABTCF_TCString = \"abc\"\n")
			.unwrap();
		assert_eq!(entries.get("IABTCF_CmpSdkID"), Some(&ConsentValue::Int(3)));
	}

	#[cfg(feature = "yaml")]
	#[test]
	fn yaml_entries() {
		let entries = AnyFormat::Yaml
			.parse_entries(b"IABTCF_gdprApplies: 1\nIABTCF_PublisherCC: DE\n")
			.unwrap();
		assert_eq!(entries.get("IABTCF_gdprApplies"), Some(&ConsentValue::Int(1)));
		assert_eq!(
			entries.get("IABTCF_PublisherCC"),
			Some(&ConsentValue::Text("DE".into()))
		);
	}
}
