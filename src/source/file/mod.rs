/* src/source/file/mod.rs */

//!
//! A preference file on disk, watched for changes with `notify`.

mod worker;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[cfg(feature = "serde-config")]
use serde::{Deserialize, Serialize};

use super::format::AnyFormat;
use super::{ChangeSink, ConsentSource, ListenerId, Listeners, Result, SourceError};
use crate::snapshot::{ConsentSnapshot, ConsentValue};
use worker::process_events;

/// Configuration for the file store's change notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-config", serde(default))]
pub struct FileStoreConfig {
	/// Quiet period after the last filesystem event before an edge fires.
	/// Zero fires on every event.
	pub debounce: Duration,

	/// Explicit file format. `None` selects by file extension.
	pub format: Option<AnyFormat>,
}

impl Default for FileStoreConfig {
	fn default() -> Self {
		Self {
			debounce: Duration::from_millis(100),
			format: None,
		}
	}
}

struct WatchState {
	_watcher: RecommendedWatcher,
	task: JoinHandle<()>,
}

impl Drop for WatchState {
	fn drop(&mut self) {
		self.task.abort();
	}
}

/// A preference store persisted as a flat JSON, TOML or YAML file.
///
/// The file is read synchronously on every [`read`](ConsentSource::read).
/// A missing file reads as an empty store. Change notification starts with
/// the first subscriber and stops with the last; it needs a tokio runtime.
pub struct FileStore {
	path: PathBuf,
	format: AnyFormat,
	config: FileStoreConfig,
	listeners: Arc<Listeners<ConsentSnapshot>>,
	watch: Mutex<Option<WatchState>>,
}

/// Builder for [`FileStore`].
#[derive(Debug, Default)]
pub struct FileStoreBuilder {
	path: Option<PathBuf>,
	config: FileStoreConfig,
}

impl FileStoreBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
		self.path = Some(path.into());
		self
	}

	pub fn format(mut self, format: AnyFormat) -> Self {
		self.config.format = Some(format);
		self
	}

	pub fn debounce(mut self, debounce: Duration) -> Self {
		self.config.debounce = debounce;
		self
	}

	pub fn config(mut self, config: FileStoreConfig) -> Self {
		self.config = config;
		self
	}

	pub fn build(self) -> Result<FileStore> {
		let path = self
			.path
			.ok_or_else(|| SourceError::Config("path is required".to_string()))?;
		FileStore::with_config(path, self.config)
	}
}

impl FileStore {
	/// Opens a store, selecting the format from the file extension.
	pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
		Self::with_config(path, FileStoreConfig::default())
	}

	pub fn with_config(path: impl Into<PathBuf>, config: FileStoreConfig) -> Result<Self> {
		let path = path.into();
		let format = match config.format {
			Some(format) => format,
			None => AnyFormat::from_path(&path)?,
		};

		Ok(Self {
			path,
			format,
			config,
			listeners: Arc::new(Listeners::new()),
			watch: Mutex::new(None),
		})
	}

	pub fn builder() -> FileStoreBuilder {
		FileStoreBuilder::new()
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn format(&self) -> AnyFormat {
		self.format
	}

	/// Reads the full key space of the file.
	pub fn entries(&self) -> Result<BTreeMap<String, ConsentValue>> {
		match std::fs::read(&self.path) {
			Ok(bytes) => self.format.parse_entries(&bytes),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
			Err(e) => Err(SourceError::Io(e)),
		}
	}

	/// Returns true while a filesystem watcher is running.
	pub fn is_watching(&self) -> bool {
		self.lock_watch().is_some()
	}

	fn start_watching(&self) -> Result<WatchState> {
		let runtime = tokio::runtime::Handle::try_current().map_err(|_| SourceError::NoRuntime)?;

		let file_name = self
			.path
			.file_name()
			.map(|name| name.to_os_string())
			.ok_or_else(|| {
				SourceError::Io(std::io::Error::new(
					std::io::ErrorKind::InvalidInput,
					format!("not a file path: {}", self.path.display()),
				))
			})?;

		let dir = match self.path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
			_ => PathBuf::from("."),
		};
		let dir = std::fs::canonicalize(&dir)?;

		let (raw_tx, raw_rx) = mpsc::channel(100);

		let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
			let _ = raw_tx.blocking_send(res);
		})?;
		watcher.watch(&dir, RecursiveMode::NonRecursive)?;

		let listeners = Arc::clone(&self.listeners);
		let debounce = self.config.debounce;
		let task = runtime.spawn(async move {
			process_events(raw_rx, listeners, file_name, debounce).await;
		});

		tracing::debug!(path = %self.path.display(), dir = %dir.display(), "started watching preference file");

		Ok(WatchState {
			_watcher: watcher,
			task,
		})
	}

	fn lock_watch(&self) -> MutexGuard<'_, Option<WatchState>> {
		self.watch.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl ConsentSource for FileStore {
	type Snapshot = ConsentSnapshot;

	fn read(&self) -> Result<Option<ConsentSnapshot>> {
		Ok(Some(ConsentSnapshot::from_entries(self.entries()?)))
	}

	fn subscribe(&self, sink: ChangeSink<ConsentSnapshot>) -> Result<ListenerId> {
		let mut watch = self.lock_watch();
		if watch.is_none() {
			*watch = Some(self.start_watching()?);
		}
		Ok(self.listeners.add(sink))
	}

	fn unsubscribe(&self, id: ListenerId) -> Result<()> {
		let mut watch = self.lock_watch();
		self.listeners.remove(id);
		if self.listeners.is_empty() && watch.take().is_some() {
			tracing::debug!(path = %self.path.display(), "stopped watching preference file");
		}
		Ok(())
	}
}

impl std::fmt::Debug for FileStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FileStore")
			.field("path", &self.path)
			.field("format", &self.format)
			.field("config", &self.config)
			.field("watching", &self.is_watching())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_file_reads_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().join("prefs.json")).unwrap();
		let snapshot = store.read().unwrap().unwrap();
		assert!(snapshot.is_empty());
	}

	#[test]
	fn read_filters_prefix() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("prefs.json");
		std::fs::write(
			&path,
			br#"{"IABTCF_CmpSdkID": 0, "IABTCF_PolicyVersion": 2, "OTHER_KEY": "x"}"#,
		)
		.unwrap();

		let store = FileStore::new(&path).unwrap();
		let snapshot = store.read().unwrap().unwrap();
		assert_eq!(snapshot.len(), 2);
		assert_eq!(snapshot.cmp_sdk_id(), Some(0));
		assert_eq!(store.entries().unwrap().len(), 3);
	}

	#[test]
	fn explicit_format_overrides_extension() {
		let store = FileStore::builder()
			.path("shared_prefs.dat")
			.format(AnyFormat::Json)
			.build()
			.unwrap();
		assert_eq!(store.format(), AnyFormat::Json);
		assert!(FileStore::new("shared_prefs.dat").is_err());
	}

	#[test]
	fn subscribe_without_runtime_fails() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileStore::new(dir.path().join("prefs.json")).unwrap();
		let result = store.subscribe(Arc::new(|_: crate::source::Change<ConsentSnapshot>| {}));
		assert!(matches!(result, Err(SourceError::NoRuntime)));
		assert!(!store.is_watching());
	}
}
