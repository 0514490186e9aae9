//! wideindex integration tests
//!
//! Scenarios run against the in-memory driver through the public API only.

pub mod common;
pub mod test_codec_properties;
pub mod test_index_maintenance;
pub mod test_integrator;
pub mod test_paging;
pub mod test_shard_strategies;

pub use common::*;
