//! Integration tests for the mirror binary
//!
//! End-to-end runs of real commands against temporary directories.

// Test modules
mod common;
mod workflows;
