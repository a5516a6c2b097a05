/* demos/basic.rs */

//! Example: Watching an in-memory preference store
//!
//! This example demonstrates:
//! - Emitting the current consent snapshot on listen
//! - Ignoring writes to unrelated keys
//! - Cancelling and listening again
//!
//! Run with: cargo run --example basic

use std::sync::Arc;

use tcflive::{ConsentValue, ConsentWatcher, MemoryStore};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// 1. Setup a store the way a platform would have it after CMP start-up
	let store = Arc::new(MemoryStore::with_entries([
		("IABTCF_CmpSdkID", ConsentValue::Int(0)),
		("IABTCF_PolicyVersion", ConsentValue::Int(2)),
		("app.theme", ConsentValue::Text("dark".into())),
	]));

	// 2. Create the watcher
	let watcher = ConsentWatcher::builder()
		.source(Arc::clone(&store))
		.label("basic")
		.build()?;

	// 3. Listen. The current snapshot arrives first
	let mut stream = watcher.listen()?;
	if let Some(item) = stream.next().await {
		println!("Initial consent: {:?}", item?);
	}

	// 4. Unrelated and identical writes are suppressed
	store.set("app.theme", "light");
	store.set("IABTCF_PolicyVersion", 2);

	// 5. A real consent change comes through
	store.set("IABTCF_CmpSdkID", 1);
	if let Some(item) = stream.next().await {
		let snapshot = item?;
		println!("Consent changed: CmpSdkID = {:?}", snapshot.cmp_sdk_id());
	}

	// 6. Cancel. The stream ends and the store has no listeners left
	watcher.cancel()?;
	assert!(stream.next().await.is_none());
	println!("Listeners after cancel: {}", store.listener_count());

	// 7. Listening again starts from scratch
	let mut stream = watcher.listen()?;
	if let Some(item) = stream.next().await {
		println!("Re-listened: {:?}", item?);
	}

	Ok(())
}
