//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fake_tool;
pub mod fixtures;

#[allow(unused_imports)]
pub use fake_tool::{FakeTool, FakeTransfer};
#[allow(unused_imports)]
pub use fixtures::{catalog_of, drain_events, terminal_count, test_downloader};
