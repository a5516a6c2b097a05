/* src/source/error.rs */

use crate::cmp::CmpError;

/// Errors raised while reading from or subscribing to a consent source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The store content could not be parsed.
	#[error("parse error: {0}")]
	Parse(String),

	/// No parser is available for the given file extension.
	#[error("unsupported store format: {0}")]
	UnsupportedFormat(String),

	#[error("Invalid configuration: {0}")]
	Config(String),

	/// Change notification needs a tokio runtime and none is running.
	#[error("no tokio runtime available to drive change notifications")]
	NoRuntime,

	#[cfg(feature = "file")]
	#[error("Notify error: {0}")]
	Notify(#[from] notify::Error),

	#[error("CMP error: {0}")]
	Cmp(#[from] CmpError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, SourceError>;
