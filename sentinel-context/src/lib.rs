//! # sentinel-context
//!
//! Renders a [`sentinel_analysis::FunctionImpact`] and an optional
//! [`sentinel_analysis::GraphSlice`] into the single Markdown blob the
//! external LLM reporter consumes. `render` is the entire public
//! surface: pure, no I/O, no clock, no randomness.

pub mod render;
mod tokenizer;

pub use render::{render, TEMPLATE_VERSION};
