//! Integration tests for flagsync

mod directory_store;
mod pipeline_runs;
mod scenarios;
mod test_utils;
