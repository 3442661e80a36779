//! Recoverable parse/resolve conditions and the preprocessor's hard failure.
//!
//! `ParseWarning` and `ResolveWarning` are never propagated as `Err`; callers
//! log them and collect them as counters instead.

use super::error_code::{self, SentinelErrorCode};

/// A recoverable condition encountered while walking a translation unit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseWarning {
    #[error("{file}: malformed construct near line {line}: {detail}")]
    MalformedConstruct {
        file: String,
        line: u32,
        detail: String,
    },

    #[error("{file}: unrecognized AST subtree skipped near line {line}")]
    UnrecognizedSubtree { file: String, line: u32 },

    #[error("{file}: file failed to parse entirely: {detail}")]
    FileFailed { file: String, detail: String },
}

impl SentinelErrorCode for ParseWarning {
    fn error_code(&self) -> &'static str {
        error_code::PARSE_WARNING
    }
}

/// A call or test reference that could not be bound to a known `FunctionNode`.
/// Never fatal — ingest creates a placeholder node instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveWarning {
    #[error("unresolved callee `{callee_name}` at {caller_id}:{line}")]
    UnresolvedCallee {
        caller_id: String,
        callee_name: String,
        line: u32,
    },

    #[error("ambiguous callee `{callee_name}`: {candidate_count} candidates in subsystem")]
    AmbiguousCallee {
        callee_name: String,
        candidate_count: usize,
    },

    #[error("unknown test framework in {file}")]
    UnknownFramework { file: String },
}

impl SentinelErrorCode for ResolveWarning {
    fn error_code(&self) -> &'static str {
        error_code::RESOLVE_WARNING
    }
}

/// Failure of the optional preprocessor wrapper. The pipeline falls back to
/// the raw file and emits a warning; this is never silently eaten deeper
/// than that one call site.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PreprocessorError {
    #[error("preprocessor tool not found: {tool}")]
    ToolMissing { tool: String },

    #[error("preprocessor exited with status {status} for {file}")]
    NonZeroExit { file: String, status: i32 },

    #[error("failed to remap #line directives in {file}: {detail}")]
    LineMapFailed { file: String, detail: String },
}

impl SentinelErrorCode for PreprocessorError {
    fn error_code(&self) -> &'static str {
        error_code::PREPROCESSOR_ERROR
    }
}
