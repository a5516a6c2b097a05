/* src/lib.rs */

//!
//! A live, deduplicated view of IAB TCF consent flags.
//!
//! This crate integrates four components:
//!
//! - **snapshot**: The flat `IABTCF_*` consent view and its comparison.
//! - **source**: Consent stores fused with their change notifiers
//!   ([`MemoryStore`](source::MemoryStore), [`FileStore`](source::FileStore)).
//! - **cmp**: The web `__tcfapi` contract and its bridge to a source.
//! - **watcher**: Unified single-subscriber stream over any source
//!   ([`ConsentWatcher`](watcher::ConsentWatcher)).
//!
//! ## Feature Flags
//!
//! - `memory` (default): In-memory preference store backed by `arc-swap`.
//! - `file` (default): File-backed preference store watched with `notify`.
//! - `toml`, `yaml`: Additional preference file formats.
//! - `serde-config`: Serde support for `FileStoreConfig`.
//! - `full`: Enables all features.
//!
//! ## Basic Usage
//!
//! See `demos/basic.rs` for a complete example.

pub mod cmp;
pub mod snapshot;
pub mod source;
pub mod watcher;

pub use cmp::{CmpBridge, MockCmp, TcData, TcfApi};
pub use snapshot::{CONSENT_KEY_PREFIX, ConsentSnapshot, ConsentValue};
pub use source::{Change, ConsentSource};
pub use watcher::{ConsentStream, ConsentWatcher, WatchError};

#[cfg(feature = "memory")]
pub use source::MemoryStore;

#[cfg(feature = "file")]
pub use source::FileStore;
