/* tests/file_store_tests.rs */

#![cfg(feature = "file")]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tcflive::snapshot::{ConsentSnapshot, ConsentValue};
use tcflive::source::{ConsentSource, FileStore, SourceError};
use tcflive::watcher::{ConsentStream, ConsentWatcher};
use tempfile::tempdir;
use tokio::time::timeout;
use tokio_stream::StreamExt;

fn write(path: &Path, content: &str) {
	std::fs::write(path, content).unwrap();
}

async fn next_snapshot(stream: &mut ConsentStream<ConsentSnapshot>) -> ConsentSnapshot {
	match timeout(Duration::from_secs(5), stream.next()).await {
		Ok(Some(Ok(snapshot))) => snapshot,
		Ok(other) => panic!("expected a snapshot, got {other:?}"),
		Err(_) => panic!("timed out waiting for a consent change"),
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn watcher_follows_consent_changes_in_the_file() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("prefs.json");
	write(&path, r#"{ "IABTCF_CmpSdkID": 0, "IABTCF_PolicyVersion": 2, "theme": "dark" }"#);

	let store = Arc::new(
		FileStore::builder()
			.path(&path)
			.debounce(Duration::from_millis(50))
			.build()
			.unwrap(),
	);
	let watcher = ConsentWatcher::new(Arc::clone(&store));
	let mut stream = watcher.listen().unwrap();
	assert!(store.is_watching());

	let initial = next_snapshot(&mut stream).await;
	assert_eq!(initial.cmp_sdk_id(), Some(0));
	assert_eq!(initial.len(), 2);

	// Only a non-consent key changes: the edge is suppressed.
	write(&path, r#"{ "IABTCF_CmpSdkID": 0, "IABTCF_PolicyVersion": 2, "theme": "light" }"#);
	tokio::time::sleep(Duration::from_millis(300)).await;

	write(&path, r#"{ "IABTCF_CmpSdkID": 1, "IABTCF_PolicyVersion": 2, "theme": "light" }"#);
	let changed = next_snapshot(&mut stream).await;
	assert_eq!(changed.cmp_sdk_id(), Some(1));
	assert_eq!(changed.policy_version(), Some(2));

	watcher.cancel().unwrap();
	assert!(!store.is_watching());
}

#[tokio::test(flavor = "multi_thread")]
async fn file_created_after_listen_is_picked_up() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("prefs.json");

	let store = FileStore::builder()
		.path(&path)
		.debounce(Duration::from_millis(50))
		.build()
		.unwrap();
	let watcher = ConsentWatcher::new(store);
	let mut stream = watcher.listen().unwrap();
	assert!(next_snapshot(&mut stream).await.is_empty());

	write(&path, r#"{ "IABTCF_gdprApplies": 1 }"#);
	let created = next_snapshot(&mut stream).await;
	assert_eq!(
		created.get("IABTCF_gdprApplies"),
		Some(&ConsentValue::Int(1))
	);
	assert_eq!(created.gdpr_applies(), Some(true));
}

#[tokio::test]
async fn unparsable_file_fails_listen() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("prefs.json");
	write(&path, "{ not json");

	let watcher = ConsentWatcher::new(FileStore::new(&path).unwrap());
	assert!(watcher.listen().is_err());
	assert!(!watcher.is_listening());
	assert!(!watcher.source().is_watching());
}

#[test]
fn unknown_extension_is_rejected() {
	let result = FileStore::new("prefs.ini");
	assert!(matches!(result, Err(SourceError::UnsupportedFormat(_))));
}

#[test]
fn builder_requires_a_path() {
	let result = FileStore::builder().build();
	assert!(matches!(result, Err(SourceError::Config(_))));
}

#[test]
fn read_works_without_a_runtime() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("prefs.json");
	write(&path, r#"{ "IABTCF_TCString": "CO-abc", "count": 3 }"#);

	let store = FileStore::new(&path).unwrap();
	let snapshot = store.read().unwrap().unwrap();
	assert_eq!(snapshot.tc_string(), Some("CO-abc"));
	assert!(!snapshot.contains_key("count"));
}
