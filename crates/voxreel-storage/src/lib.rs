//! Local narration journal and asset storage.
//!
//! This crate provides:
//! - Per-subject directories under a configurable store root
//! - A JSON-lines narration journal with append, list and atomic update
//! - Binary asset storage with create-exclusive semantics

pub mod assets;
pub mod error;
pub mod journal;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{AssetDir, NarrationStore, JOURNAL_FILE};
