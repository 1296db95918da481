//! Test helpers shared across ctxvault crates.

pub mod fixtures;
pub mod sink;

pub use fixtures::{corrupt_file, fast_retry_config, record_fixture};
pub use sink::RecordingSink;
