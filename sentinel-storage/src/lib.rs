//! # sentinel-storage
//!
//! The sole gatekeeper to the persisted graph: schema install,
//! batched single-writer upserts over a dedicated thread, subsystem purge,
//! and the typed read queries `sentinel-analysis` traverses.

pub mod batch;
pub mod engine;
pub mod queries;
pub mod schema;

pub use engine::SentinelGraphStore;
