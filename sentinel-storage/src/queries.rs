//! Typed read queries that always return typed records. All reads are
//! plain `SELECT`s against the connection the engine keeps for that purpose
//! — readers never touch the writer thread's connection.

use rusqlite::{Connection, OptionalExtension};

use sentinel_core::errors::StorageError;
use sentinel_core::traits::storage::GraphStats;
use sentinel_core::types::identifiers::{FunctionId, TestCaseId, VariableId};
use sentinel_core::types::records::{
    CallRecord, CoverageKind, CoversRecord, DataFlowRecord, FlowKind, FunctionRecord,
    TestCaseRecord,
};

fn flow_kind_from_str(s: &str) -> FlowKind {
    match s {
        "initialization" => FlowKind::Initialization,
        "parameter_binding_local" => FlowKind::ParameterBindingLocal,
        "return_value" => FlowKind::ReturnValue,
        _ => FlowKind::Assignment,
    }
}

fn coverage_kind_from_str(s: &str) -> CoverageKind {
    match s {
        "indirect" => CoverageKind::Indirect,
        _ => CoverageKind::Direct,
    }
}

fn map_err(e: rusqlite::Error) -> StorageError {
    StorageError::Sqlite { message: e.to_string() }
}

fn row_to_function(row: &rusqlite::Row) -> rusqlite::Result<FunctionRecord> {
    Ok(FunctionRecord {
        id: FunctionId::from(row.get::<_, String>(0)?),
        name: row.get(1)?,
        file_path: row.get(2)?,
        line_start: row.get(3)?,
        line_end: row.get(4)?,
        is_static: row.get(5)?,
        is_inline: row.get(6)?,
        subsystem: row.get(7)?,
        return_type: row.get(8)?,
    })
}

pub fn find_functions_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Vec<FunctionRecord>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, file_path, line_start, line_end, is_static, is_inline, subsystem, return_type
             FROM functions WHERE name = ?1",
        )
        .map_err(map_err)?;
    let rows = stmt
        .query_map([name], row_to_function)
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    Ok(rows)
}

pub fn get_function(
    conn: &Connection,
    id: &FunctionId,
) -> Result<Option<FunctionRecord>, StorageError> {
    conn.query_row(
        "SELECT id, name, file_path, line_start, line_end, is_static, is_inline, subsystem, return_type
         FROM functions WHERE id = ?1",
        [id.as_str()],
        row_to_function,
    )
    .optional()
    .map_err(map_err)
}

pub fn list_functions(conn: &Connection, subsystem: &str) -> Result<Vec<FunctionRecord>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, file_path, line_start, line_end, is_static, is_inline, subsystem, return_type
             FROM functions WHERE subsystem = ?1",
        )
        .map_err(map_err)?;
    stmt.query_map([subsystem], row_to_function)
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)
}

pub fn list_calls(conn: &Connection, subsystem: &str) -> Result<Vec<CallRecord>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT c.caller_id, c.callee_id, c.callee_name, c.line_number, c.is_resolved
             FROM calls c JOIN functions f ON f.id = c.caller_id
             WHERE f.subsystem = ?1",
        )
        .map_err(map_err)?;
    let rows = stmt
        .query_map([subsystem], |row| {
            Ok(CallRecord {
                caller_id: FunctionId::from(row.get::<_, String>(0)?),
                callee_id: FunctionId::from(row.get::<_, String>(1)?),
                callee_name: row.get(2)?,
                line_number: row.get(3)?,
                is_resolved: row.get(4)?,
            })
        })
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    Ok(rows)
}

pub fn list_covers(conn: &Connection, subsystem: &str) -> Result<Vec<CoversRecord>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT co.test_id, co.function_id, co.coverage_kind, co.confidence
             FROM covers co JOIN functions f ON f.id = co.function_id
             WHERE f.subsystem = ?1",
        )
        .map_err(map_err)?;
    let rows = stmt
        .query_map([subsystem], |row| {
            Ok(CoversRecord {
                test_id: TestCaseId::from(row.get::<_, String>(0)?),
                function_id: FunctionId::from(row.get::<_, String>(1)?),
                coverage_kind: coverage_kind_from_str(&row.get::<_, String>(2)?),
                confidence: row.get(3)?,
            })
        })
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    Ok(rows)
}

pub fn list_tests(conn: &Connection, subsystem: &str) -> Result<Vec<TestCaseRecord>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT t.id, t.name, t.file_path, t.framework, t.assertions_count
             FROM test_cases t JOIN covers co ON co.test_id = t.id
             JOIN functions f ON f.id = co.function_id
             WHERE f.subsystem = ?1",
        )
        .map_err(map_err)?;
    let rows = stmt
        .query_map([subsystem], |row| {
            Ok(TestCaseRecord {
                id: TestCaseId::from(row.get::<_, String>(0)?),
                name: row.get(1)?,
                file_path: row.get(2)?,
                framework: row.get(3)?,
                assertions_count: row.get(4)?,
            })
        })
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    Ok(rows)
}

pub fn list_flows_for_function(
    conn: &Connection,
    function_id: &FunctionId,
) -> Result<Vec<DataFlowRecord>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT function_id, source_id, target_id, flow_kind, line_number, source_expression, confidence
             FROM flows WHERE function_id = ?1",
        )
        .map_err(map_err)?;
    let rows = stmt
        .query_map([function_id.as_str()], |row| {
            Ok(DataFlowRecord {
                function_id: FunctionId::from(row.get::<_, String>(0)?),
                source_id: VariableId::from(row.get::<_, String>(1)?),
                target_id: VariableId::from(row.get::<_, String>(2)?),
                flow_kind: flow_kind_from_str(&row.get::<_, String>(3)?),
                line_number: row.get(4)?,
                source_expression: row.get(5)?,
                confidence: row.get(6)?,
            })
        })
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    Ok(rows)
}

pub fn stats(conn: &Connection) -> Result<GraphStats, StorageError> {
    let count = |sql: &str| -> Result<usize, StorageError> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(map_err)
    };
    Ok(GraphStats {
        function_count: count("SELECT COUNT(*) FROM functions")?,
        variable_count: count("SELECT COUNT(*) FROM variables")?,
        call_count: count("SELECT COUNT(*) FROM calls")?,
        flow_count: count("SELECT COUNT(*) FROM flows")?,
        test_case_count: count("SELECT COUNT(*) FROM test_cases")?,
        covers_count: count("SELECT COUNT(*) FROM covers")?,
        placeholder_function_count: count("SELECT COUNT(*) FROM functions WHERE id LIKE '<placeholder>::%'")?,
    })
}
