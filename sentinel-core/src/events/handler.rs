//! Progress-reporting trait so a long ingest can report status without the
//! core coupling to any particular terminal/UI library (the CLI's colored
//! output stays entirely external).

use super::types::{IngestCompleteEvent, IngestProgressEvent, IngestStartedEvent, IngestWarningEvent};

pub trait SentinelEventHandler: Send + Sync {
    fn on_ingest_started(&self, _event: &IngestStartedEvent) {}
    fn on_ingest_progress(&self, _event: &IngestProgressEvent) {}
    fn on_ingest_warning(&self, _event: &IngestWarningEvent) {}
    fn on_ingest_complete(&self, _event: &IngestCompleteEvent) {}
}

/// A no-op handler for callers that don't need progress reporting (tests, benches).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventHandler;

impl SentinelEventHandler for NullEventHandler {}
