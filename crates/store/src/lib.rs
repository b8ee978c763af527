//! Snapshot persistence for Mirror
//!
//! This crate provides:
//! - Little-endian binary reader/writer primitives (`binary`)
//! - One codec per on-disk format version (`formats`)
//! - Version -> codec lookup (`registry`)
//! - Loading and saving the snapshot file (`store`)

pub mod binary;
pub mod codec;
pub mod error;
pub mod formats;
pub mod registry;
pub mod store;

// Re-exports
pub use codec::{FormatVersion, SnapshotCodec};
pub use error::{DecodeError, InvalidStore};
pub use registry::{FormatRegistry, CURRENT_VERSION, HEADER};
pub use store::SnapshotStore;

/// Result type for store operations
pub type Result<T> = anyhow::Result<T>;
