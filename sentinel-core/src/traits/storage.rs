//! The sole read/write contract for the graph store.
//!
//! `sentinel-storage` implements these; `sentinel-analysis` and
//! `sentinel-context` depend only on the trait, never on `rusqlite`
//! directly, so the impact analyzer and context builder can be exercised
//! against an in-memory fake in tests.

use crate::errors::StorageError;
use crate::types::identifiers::FunctionId;
use crate::types::records::{
    CallRecord, CoversRecord, DataFlowRecord, FunctionRecord, TestCaseRecord, VariableRecord,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStats {
    pub function_count: usize,
    pub variable_count: usize,
    pub call_count: usize,
    pub flow_count: usize,
    pub test_case_count: usize,
    pub covers_count: usize,
    pub placeholder_function_count: usize,
}

/// Write-side operations. Every `upsert_*`/`purge_subsystem` call is its own
/// transaction; on failure the whole batch rolls back.
pub trait GraphWriter {
    /// Create uniqueness constraints and indices. Idempotent.
    fn install_schema(&self) -> Result<(), StorageError>;

    fn upsert_functions(&self, batch: &[FunctionRecord]) -> Result<(), StorageError>;
    fn upsert_variables(&self, batch: &[VariableRecord]) -> Result<(), StorageError>;
    fn upsert_calls(&self, batch: &[CallRecord]) -> Result<(), StorageError>;
    fn upsert_flows(&self, batch: &[DataFlowRecord]) -> Result<(), StorageError>;
    fn upsert_tests(&self, batch: &[TestCaseRecord]) -> Result<(), StorageError>;
    fn upsert_covers(&self, batch: &[CoversRecord]) -> Result<(), StorageError>;

    /// Delete every `Function` (and cascading `Variable`s, outgoing
    /// `FLOWS_TO`, outgoing `CALLS`) whose `subsystem` matches. Incoming
    /// `CALLS` from other subsystems survive, pointing at placeholders.
    fn purge_subsystem(&self, subsystem: &str) -> Result<(), StorageError>;
}

/// Read-side operations. All reads are read-only and safe to run
/// concurrently with other readers.
pub trait GraphReader {
    fn find_functions_by_name(&self, name: &str) -> Result<Vec<FunctionRecord>, StorageError>;
    fn get_function(&self, id: &FunctionId) -> Result<Option<FunctionRecord>, StorageError>;

    /// Every `FunctionRecord` with `subsystem == subsystem`, for building the
    /// in-memory call graph the impact analyzer traverses.
    fn list_functions(&self, subsystem: &str) -> Result<Vec<FunctionRecord>, StorageError>;
    /// Every `CALLS` edge whose caller belongs to `subsystem`.
    fn list_calls(&self, subsystem: &str) -> Result<Vec<CallRecord>, StorageError>;
    /// Every `COVERS` edge whose function belongs to `subsystem`.
    fn list_covers(&self, subsystem: &str) -> Result<Vec<CoversRecord>, StorageError>;
    fn list_tests(&self, subsystem: &str) -> Result<Vec<TestCaseRecord>, StorageError>;
    /// Every `FLOWS_TO` edge owned by one function.
    fn list_flows_for_function(
        &self,
        function_id: &FunctionId,
    ) -> Result<Vec<DataFlowRecord>, StorageError>;

    fn stats(&self) -> Result<GraphStats, StorageError>;
}
