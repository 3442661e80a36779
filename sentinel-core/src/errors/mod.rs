//! Error taxonomy for Kernel-GraphRAG Sentinel.
//!
//! Five error kinds in total. `ParseWarning` and `ResolveWarning` never
//! abort a run (they are logged and counted); the rest propagate.

pub mod analysis_error;
pub mod context_error;
pub mod error_code;
pub mod parse_error;
pub mod storage_error;

pub use analysis_error::AnalysisError;
pub use context_error::ContextError;
pub use error_code::SentinelErrorCode;
pub use parse_error::{ParseWarning, PreprocessorError, ResolveWarning};
pub use storage_error::StorageError;
