//! Workflow integration tests
//!
//! Tests for complete workflows that exercise multiple commands
//! and validate end-to-end behavior.

pub mod config_file;
pub mod settings;
pub mod watch_lifecycle;
