/* demos/file_store.rs */

//! Example: Watching a preference file on disk
//!
//! Run with: cargo run --example file_store

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tcflive::{ConsentWatcher, FileStore};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// 0. Prepare a real file
	let path = "example_prefs.json";
	fs::write(path, br#"{ "IABTCF_gdprApplies": 1, "IABTCF_CmpSdkID": 0, "theme": "dark" }"#)?;
	println!("Created {}", path);

	// 1. Open the store with a short debounce
	let store = Arc::new(
		FileStore::builder()
			.path(path)
			.debounce(Duration::from_millis(50))
			.build()?,
	);
	let watcher = ConsentWatcher::new(Arc::clone(&store));

	// 2. Listen
	let mut stream = watcher.listen()?;
	if let Some(item) = stream.next().await {
		println!("Initial consent: {:?}", item?);
	}

	// 3. Modify the file in the background
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(200)).await;
		println!("Writing unrelated change...");
		let _ = fs::write(path, br#"{ "IABTCF_gdprApplies": 1, "IABTCF_CmpSdkID": 0, "theme": "light" }"#);

		tokio::time::sleep(Duration::from_millis(300)).await;
		println!("Writing consent change...");
		let _ = fs::write(path, br#"{ "IABTCF_gdprApplies": 1, "IABTCF_CmpSdkID": 7, "theme": "light" }"#);
	});

	// 4. Only the consent change arrives
	match tokio::time::timeout(Duration::from_secs(5), stream.next()).await {
		Ok(Some(item)) => println!("Consent changed: CmpSdkID = {:?}", item?.cmp_sdk_id()),
		Ok(None) => println!("Stream ended"),
		Err(_) => println!("Timed out waiting for a change"),
	}

	// 5. Cleanup
	watcher.cancel()?;
	println!("Watching after cancel: {}", store.is_watching());
	fs::remove_file(path)?;

	Ok(())
}
