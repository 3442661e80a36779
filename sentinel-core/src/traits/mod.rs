//! Shared traits crossing the `sentinel-storage` boundary.

pub mod storage;

pub use storage::{GraphReader, GraphWriter};
