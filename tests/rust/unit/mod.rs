//! Unit tests - public API checks that need no catalog snapshot on disk
//!
//! These tests exercise single components through the crate's public surface.

mod config_tests;
mod introspection_failure_tests;
mod naming_tests;
