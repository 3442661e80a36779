//! Fan-out dispatcher for callers who want to compose several event handlers
//! (e.g. a logging handler plus a progress-bar handler).

use super::handler::SentinelEventHandler;
use super::types::{IngestCompleteEvent, IngestProgressEvent, IngestStartedEvent, IngestWarningEvent};

#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Box<dyn SentinelEventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn SentinelEventHandler>) {
        self.handlers.push(handler);
    }
}

impl SentinelEventHandler for EventDispatcher {
    fn on_ingest_started(&self, event: &IngestStartedEvent) {
        for h in &self.handlers {
            h.on_ingest_started(event);
        }
    }

    fn on_ingest_progress(&self, event: &IngestProgressEvent) {
        for h in &self.handlers {
            h.on_ingest_progress(event);
        }
    }

    fn on_ingest_warning(&self, event: &IngestWarningEvent) {
        for h in &self.handlers {
            h.on_ingest_warning(event);
        }
    }

    fn on_ingest_complete(&self, event: &IngestCompleteEvent) {
        for h in &self.handlers {
            h.on_ingest_complete(event);
        }
    }
}
