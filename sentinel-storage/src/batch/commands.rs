//! `BatchCommand` — every write operation that can be buffered and flushed
//! as one transaction.

use sentinel_core::types::records::{
    CallRecord, CoversRecord, DataFlowRecord, FunctionRecord, TestCaseRecord, VariableRecord,
};

#[derive(Debug)]
pub enum BatchCommand {
    UpsertFunctions(Vec<FunctionRecord>),
    UpsertVariables(Vec<VariableRecord>),
    UpsertCalls(Vec<CallRecord>),
    UpsertFlows(Vec<DataFlowRecord>),
    UpsertTests(Vec<TestCaseRecord>),
    UpsertCovers(Vec<CoversRecord>),
    PurgeSubsystem(String),
    /// Fire-and-forget flush of whatever is currently buffered.
    Flush,
    /// Flush and block the sender until the commit completes.
    FlushSync(std::sync::mpsc::SyncSender<()>),
    Shutdown,
}
