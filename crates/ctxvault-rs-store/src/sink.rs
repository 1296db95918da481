//! Default event sink that forwards store events to the `log` facade.

use ctxvault_rs_protocol::{StoreEvent, StoreEventSink};
use log::{debug, warn};

/// Writes every event as a JSON line at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl StoreEventSink for LogEventSink {
    fn emit(&self, event: StoreEvent) {
        match serde_json::to_string(&event) {
            Ok(encoded) => debug!("store event (event={encoded})"),
            Err(err) => warn!("failed to encode store event (event={event:?}): {err}"),
        }
    }
}
