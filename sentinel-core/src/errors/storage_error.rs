//! Storage-layer errors.
//!
//! `SchemaError` and fatal variants are surfaced immediately; `Transient`
//! variants are retried up to `constants::MAX_STORE_RETRIES` times with
//! exponential backoff before becoming fatal.

use super::error_code::{self, SentinelErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("schema error: {message}")]
    Schema { message: String },

    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("database busy (retry {attempt}/{max_attempts})")]
    Busy { attempt: u32, max_attempts: u32 },

    #[error("transient store error exhausted after {attempts} attempts: {message}")]
    TransientExhausted { attempts: u32, message: String },

    #[error("fatal store error: {message}")]
    Fatal { message: String },

    #[error("batch writer channel disconnected")]
    ChannelDisconnected,
}

impl StorageError {
    /// Whether this variant should be retried by the caller rather than surfaced.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

impl SentinelErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Schema { .. } => error_code::SCHEMA_ERROR,
            Self::Busy { .. } => error_code::TRANSIENT_STORE_ERROR,
            Self::TransientExhausted { .. } | Self::Fatal { .. } | Self::Sqlite { .. }
            | Self::ChannelDisconnected => error_code::FATAL_STORE_ERROR,
        }
    }
}
