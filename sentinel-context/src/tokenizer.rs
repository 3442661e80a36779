//! Token counting for the rendered report footer: a cached
//! `tiktoken_rs::CoreBPE`, with a model-name fallback to `gpt-4` and a
//! 4-chars-per-token approximation when the tokenizer can't load.

use std::sync::OnceLock;

use sentinel_core::errors::ContextError;

pub struct TokenCounter {
    model: String,
    bpe: OnceLock<Option<tiktoken_rs::CoreBPE>>,
}

impl TokenCounter {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            bpe: OnceLock::new(),
        }
    }

    fn get_bpe(&self) -> Result<&tiktoken_rs::CoreBPE, ContextError> {
        let cached = self.bpe.get_or_init(|| {
            tiktoken_rs::get_bpe_from_model(&self.model)
                .or_else(|_| tiktoken_rs::get_bpe_from_model("gpt-4"))
                .ok()
        });
        cached.as_ref().ok_or_else(|| ContextError::TokenizerUnavailable {
            model: self.model.clone(),
        })
    }

    pub fn count(&self, text: &str) -> Result<usize, ContextError> {
        let bpe = self.get_bpe()?;
        Ok(bpe.encode_with_special_tokens(text).len())
    }

    /// 4 chars ≈ 1 token — used when the exact tokenizer can't be loaded.
    /// `render` never fails on a tokenizer miss; it falls back to this.
    pub fn count_approximate(text: &str) -> usize {
        text.len().div_ceil(4)
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new("gpt-4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_roughly_one_token_per_short_word() {
        let counter = TokenCounter::new("gpt-4");
        let count = counter.count("Hello, world!").unwrap();
        assert!(count > 0 && count < 10);
    }

    #[test]
    fn approximate_count_is_length_over_four() {
        assert_eq!(TokenCounter::count_approximate("twelve chars"), 3);
    }
}
