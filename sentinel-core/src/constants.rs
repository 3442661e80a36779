//! Shared defaults for batching, traversal depth, and pattern matching used
//! across the ingestion and analysis pipeline.

/// Default batch size for graph-store upserts.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default and hard-maximum traversal depth for the impact analyzer.
pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const HARD_MAX_DEPTH: usize = 10;

/// Default bounded-channel capacity between parser workers and the ingester.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Maximum source variables attributed to one compound-expression flow.
pub const MAX_FLOW_SOURCES_PER_EXPRESSION: usize = 10;

/// Retry budget for transient store errors.
pub const MAX_STORE_RETRIES: u32 = 3;

/// Default syscall entry-point patterns.
pub const DEFAULT_SYSCALL_PREFIXES: &[&str] = &["sys_", "__x64_sys_"];

/// Synthetic target variable name for return-value flows.
pub const RETURN_VALUE_VARIABLE: &str = "__return__";

/// Directory/file-suffix markers that identify test files.
pub const TEST_FILE_SUFFIX: &str = "_test.c";
pub const TEST_DIR_MARKERS: &[&str] = &["tools/testing/", "kunit/"];

/// External preprocessor binary used when preprocessing is enabled.
pub const DEFAULT_PREPROCESSOR_TOOL: &str = "cc";
