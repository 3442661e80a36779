//! # sentinel-core
//!
//! Foundation crate for Kernel-GraphRAG Sentinel.
//! Defines configuration, the error taxonomy, identifiers, event types, and
//! the shared traits every other crate in the workspace builds on.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod traits;
pub mod types;

pub use config::SentinelConfig;
pub use errors::error_code::SentinelErrorCode;
pub use events::dispatcher::EventDispatcher;
pub use events::handler::{NullEventHandler, SentinelEventHandler};
pub use events::types::{
    IngestCompleteEvent, IngestProgressEvent, IngestStartedEvent, IngestStats, IngestWarningEvent,
};
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::identifiers::{FunctionId, TestCaseId, VariableId};
