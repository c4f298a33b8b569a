//! FlagForge: Manifest-Driven Flag Preprocessing
//!
//! Downloads flag-list manifests, verifies and caches the config fragments
//! they reference, merges the selected fragments into one settings document,
//! and places it into every versioned install of the target application.

pub mod cache;
pub mod cli;
pub mod defaults;
pub mod error;
pub mod fetch;
pub mod fsutil;
pub mod hashing;
pub mod install;
pub mod logging;
pub mod manifest;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod selection;
pub mod settings;
