//! The actual SQL behind each `BatchCommand`: merge-by-id upserts,
//! run inside the transaction `writer.rs` opens per flush.

use rusqlite::Transaction;

use sentinel_core::types::records::{
    CallRecord, CoversRecord, DataFlowRecord, FlowKind, FunctionRecord, TestCaseRecord,
    VariableKind, VariableRecord,
};

pub fn upsert_functions(tx: &Transaction, rows: &[FunctionRecord]) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO functions (id, name, file_path, line_start, line_end, is_static, is_inline, subsystem, return_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name, file_path = excluded.file_path, line_start = excluded.line_start,
            line_end = excluded.line_end, is_static = excluded.is_static, is_inline = excluded.is_inline,
            subsystem = excluded.subsystem, return_type = excluded.return_type",
    )?;
    for row in rows {
        stmt.execute(rusqlite::params![
            row.id.as_str(),
            row.name,
            row.file_path,
            row.line_start,
            row.line_end,
            row.is_static,
            row.is_inline,
            row.subsystem,
            row.return_type,
        ])?;
    }
    Ok(())
}

pub fn upsert_variables(tx: &Transaction, rows: &[VariableRecord]) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO variables (id, function_id, name, type_string, kind, is_pointer, declaration_line, initial_value_expr)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            function_id = excluded.function_id, name = excluded.name, type_string = excluded.type_string,
            kind = excluded.kind, is_pointer = excluded.is_pointer, declaration_line = excluded.declaration_line,
            initial_value_expr = excluded.initial_value_expr",
    )?;
    for row in rows {
        stmt.execute(rusqlite::params![
            row.id.as_str(),
            row.function_id.as_str(),
            row.name,
            row.type_string,
            variable_kind_str(row.kind),
            row.is_pointer,
            row.declaration_line,
            row.initial_value_expr,
        ])?;
    }
    Ok(())
}

pub fn upsert_calls(tx: &Transaction, rows: &[CallRecord]) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO calls (caller_id, callee_id, callee_name, line_number, is_resolved)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(caller_id, line_number) DO UPDATE SET
            callee_id = excluded.callee_id, callee_name = excluded.callee_name, is_resolved = excluded.is_resolved",
    )?;
    for row in rows {
        stmt.execute(rusqlite::params![
            row.caller_id.as_str(),
            row.callee_id.as_str(),
            row.callee_name,
            row.line_number,
            row.is_resolved,
        ])?;
    }
    Ok(())
}

pub fn upsert_flows(tx: &Transaction, rows: &[DataFlowRecord]) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO flows (function_id, source_id, target_id, flow_kind, line_number, source_expression, confidence)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(function_id, target_id, line_number) DO UPDATE SET
            source_id = excluded.source_id, flow_kind = excluded.flow_kind,
            source_expression = excluded.source_expression, confidence = excluded.confidence",
    )?;
    for row in rows {
        stmt.execute(rusqlite::params![
            row.function_id.as_str(),
            row.source_id.as_str(),
            row.target_id.as_str(),
            flow_kind_str(row.flow_kind),
            row.line_number,
            row.source_expression,
            row.confidence,
        ])?;
    }
    Ok(())
}

pub fn upsert_tests(tx: &Transaction, rows: &[TestCaseRecord]) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO test_cases (id, name, file_path, framework, assertions_count)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name, file_path = excluded.file_path, framework = excluded.framework,
            assertions_count = excluded.assertions_count",
    )?;
    for row in rows {
        stmt.execute(rusqlite::params![
            row.id.as_str(),
            row.name,
            row.file_path,
            row.framework,
            row.assertions_count,
        ])?;
    }
    Ok(())
}

pub fn upsert_covers(tx: &Transaction, rows: &[CoversRecord]) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO covers (test_id, function_id, coverage_kind, confidence)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(test_id, function_id) DO UPDATE SET
            coverage_kind = excluded.coverage_kind, confidence = excluded.confidence",
    )?;
    for row in rows {
        stmt.execute(rusqlite::params![
            row.test_id.as_str(),
            row.function_id.as_str(),
            coverage_kind_str(row.coverage_kind),
            row.confidence,
        ])?;
    }
    Ok(())
}

/// Cascade rule: purging a subsystem purges its Functions' owned
/// Variables and outgoing FLOWS_TO/CALLS. Incoming CALLS from other
/// subsystems are left pointing at whatever they pointed at — if that
/// target is now gone the row still satisfies placeholder semantics
/// only ever apply to unresolved callee names, never to id lookups).
pub fn purge_subsystem(tx: &Transaction, subsystem: &str) -> rusqlite::Result<()> {
    tx.execute(
        "DELETE FROM flows WHERE function_id IN (SELECT id FROM functions WHERE subsystem = ?1)",
        [subsystem],
    )?;
    tx.execute(
        "DELETE FROM variables WHERE function_id IN (SELECT id FROM functions WHERE subsystem = ?1)",
        [subsystem],
    )?;
    tx.execute(
        "DELETE FROM calls WHERE caller_id IN (SELECT id FROM functions WHERE subsystem = ?1)",
        [subsystem],
    )?;
    tx.execute(
        "DELETE FROM covers WHERE function_id IN (SELECT id FROM functions WHERE subsystem = ?1)",
        [subsystem],
    )?;
    tx.execute("DELETE FROM functions WHERE subsystem = ?1", [subsystem])?;
    tx.execute("DELETE FROM partial_ingest WHERE subsystem = ?1", [subsystem])?;
    Ok(())
}

fn variable_kind_str(kind: VariableKind) -> &'static str {
    kind.as_str()
}

fn flow_kind_str(kind: FlowKind) -> &'static str {
    kind.as_str()
}

fn coverage_kind_str(kind: sentinel_core::types::records::CoverageKind) -> &'static str {
    kind.as_str()
}
