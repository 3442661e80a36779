//! Query-time errors from the impact analyzer.

use super::error_code::{self, SentinelErrorCode};
use super::storage_error::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("function not found: {name}")]
    FunctionNotFound { name: String },

    #[error("ambiguous function `{name}`: {candidate_count} matches, supply file_path")]
    AmbiguousFunction { name: String, candidate_count: usize },

    #[error("max_depth {requested} out of range, clamped to 1..={hard_max}")]
    InvalidDepth { requested: usize, hard_max: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SentinelErrorCode for AnalysisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FunctionNotFound { .. } => error_code::FUNCTION_NOT_FOUND,
            Self::AmbiguousFunction { .. } => error_code::AMBIGUOUS_FUNCTION,
            Self::InvalidDepth { .. } => error_code::INVALID_DEPTH,
            Self::Storage(e) => e.error_code(),
        }
    }
}
