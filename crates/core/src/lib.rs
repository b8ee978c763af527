//! Core data model for Mirror
//!
//! This crate provides:
//! - `*` glob matching (`pattern`)
//! - Include/exclude filters and filter chains (`filter`)
//! - Escapable delimiter splitting for pattern lists (`escape`)
//! - Watch definitions and their validation (`config`)
//! - Typed key/value settings (`settings`)
//! - The persisted application snapshot (`snapshot`)

pub mod config;
pub mod escape;
pub mod filter;
pub mod pattern;
pub mod settings;
pub mod snapshot;

// Re-exports
pub use config::{ConfigError, WatchConfig, WatchRequest, PATTERN_DELIMITER};
pub use escape::split_escapable;
pub use filter::{Filter, FilterBehaviour, FilterChain};
pub use pattern::matches;
pub use settings::{DynamicValue, Settings, ValueError, ValueKind};
pub use snapshot::AppSnapshot;
