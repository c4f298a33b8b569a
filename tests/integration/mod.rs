//! Integration tests for the FlagForge preprocessing pipeline

mod test_utils;

mod cache_behavior;
mod pipeline_flow;
mod selection_flow;
