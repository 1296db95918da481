use ctxvault_rs_protocol::{StoreEvent, StoreEventSink};
use parking_lot::Mutex;

/// Event sink that keeps every event in memory for assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of events emitted so far, in order.
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().clone()
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&StoreEvent) -> bool,
    {
        self.events.lock().iter().filter(|event| predicate(event)).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl StoreEventSink for RecordingSink {
    fn emit(&self, event: StoreEvent) {
        self.events.lock().push(event);
    }
}
