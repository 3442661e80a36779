//! Context-rendering errors from the LLM context builder.

use super::error_code::{self, SentinelErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("tokenizer unavailable for model `{model}`, falling back to approximate counting is not permitted here")]
    TokenizerUnavailable { model: String },

    #[error("unknown template version `{version}`")]
    UnknownTemplateVersion { version: String },
}

impl SentinelErrorCode for ContextError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TokenizerUnavailable { .. } => error_code::TOKENIZER_UNAVAILABLE,
            Self::UnknownTemplateVersion { .. } => error_code::UNKNOWN_TEMPLATE_VERSION,
        }
    }
}
