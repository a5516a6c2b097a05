/* src/watcher/error.rs */

use thiserror::Error;

use crate::source::SourceError;

/// Errors that can occur in the consent watcher.
#[derive(Debug, Error)]
pub enum WatchError {
	/// `listen` was called while a subscription is active.
	#[error("watcher already has an active subscription")]
	AlreadyListening,

	#[error("Source error: {0}")]
	Source(#[from] SourceError),

	#[error("Builder error: {0}")]
	Builder(String),
}
