//! # sentinel-parser
//!
//! Turns C translation units into the DTOs `sentinel-storage` persists:
//! [`FunctionRecord`], [`CallRecord`] (`ast`), [`VariableRecord`],
//! [`DataFlowRecord`] (`dataflow`), plus an optional preprocessor wrapper and
//! a content-hash helper used for incremental re-scans.

pub mod ast;
pub mod content_hash;
pub mod dataflow;
pub mod preprocessor;

pub use ast::{
    extract_from_file, extract_from_file_with_preprocessing, extract_from_subsystem,
    extract_from_subsystem_with_preprocessing, FileExtraction, SubsystemExtraction,
};
pub use content_hash::hash_content;
pub use dataflow::extract_function_dataflow;
pub use preprocessor::{preprocess_file, LineMap, PreprocessedSource};
