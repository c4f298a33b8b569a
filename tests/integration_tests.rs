//! Integration tests entry point
//!
//! Includes all integration test modules from the integration/ subdirectory.
//! Rust compiles files in tests/ as separate test binaries, so this approach
//! allows organizing tests in subdirectories while keeping discoverability.

mod integration;
