use ctxvault_rs_config::RetryConfig;
use ctxvault_rs_protocol::ContextRecord;
use std::fs;
use std::path::Path;

/// A valid record with a fixed id.
pub fn record_fixture(id: &str, title: &str, content: &str) -> ContextRecord {
    ContextRecord::new(title, content).with_id(id)
}

/// Overwrite `path` with bytes that are not a JSON document.
pub fn corrupt_file(path: &Path) {
    fs::write(path, b"{\"id\": \"trunc").expect("write corrupt file");
}

/// Default attempt budget with no backoff, so retry paths stay fast.
pub fn fast_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay_ms: 0,
    }
}
