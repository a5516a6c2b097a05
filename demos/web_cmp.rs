/* demos/web_cmp.rs */

//! Example: Watching a web CMP through `__tcfapi`
//!
//! Uses the in-process mock CMP. Its answer to `addEventListener` is
//! delivered before `listen` returns, and later pushes are compared with
//! the last delivered TC data.
//!
//! Run with: cargo run --example web_cmp

use std::sync::Arc;

use serde_json::json;
use tcflive::{CmpBridge, ConsentWatcher, MockCmp};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// 1. Setup the CMP and bridge it to a consent source
	let cmp = Arc::new(MockCmp::new());
	let watcher = ConsentWatcher::new(CmpBridge::new(Arc::clone(&cmp)));

	// 2. Listen and print the data the CMP answered with
	let mut stream = watcher.listen()?;
	if let Some(item) = stream.next().await {
		let data = item?;
		println!(
			"TC data: policy v{:?}, gdprApplies = {:?}, purpose 2 consent = {:?}",
			data.tcf_policy_version,
			data.gdpr_applies,
			data.purpose_consent(2)
		);
	}

	// 3. The user completes the consent dialog
	let mut data = MockCmp::test_tc_data();
	data["eventStatus"] = json!("useractioncomplete");
	data["purpose"]["consents"]["1"] = json!(true);
	cmp.update(data);

	if let Some(item) = stream.next().await {
		let data = item?;
		println!(
			"Updated: settled = {}, purpose 1 consent = {:?}",
			data.is_settled(),
			data.purpose_consent(1)
		);
	}

	// 4. Cancel removes the listener from the CMP
	watcher.cancel()?;
	println!("CMP listeners after cancel: {}", cmp.listener_count());

	Ok(())
}
