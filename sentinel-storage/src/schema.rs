//! DDL for the labeled property graph. Every table is keyed by the
//! deterministic string id `sentinel-core` builds — there is no surrogate
//! integer primary key anywhere in this schema.

use rusqlite::Connection;

use sentinel_core::errors::StorageError;

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS functions (
        id           TEXT PRIMARY KEY,
        name         TEXT NOT NULL,
        file_path    TEXT NOT NULL,
        line_start   INTEGER NOT NULL,
        line_end     INTEGER NOT NULL,
        is_static    INTEGER NOT NULL,
        is_inline    INTEGER NOT NULL,
        subsystem    TEXT NOT NULL,
        return_type  TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_functions_name ON functions(name)",
    "CREATE INDEX IF NOT EXISTS idx_functions_subsystem ON functions(subsystem)",
    r#"
    CREATE TABLE IF NOT EXISTS variables (
        id                 TEXT PRIMARY KEY,
        function_id        TEXT NOT NULL,
        name               TEXT NOT NULL,
        type_string        TEXT,
        kind               TEXT NOT NULL,
        is_pointer         INTEGER NOT NULL,
        declaration_line   INTEGER NOT NULL,
        initial_value_expr TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_variables_name ON variables(name)",
    "CREATE INDEX IF NOT EXISTS idx_variables_function_id ON variables(function_id)",
    r#"
    CREATE TABLE IF NOT EXISTS calls (
        caller_id    TEXT NOT NULL,
        callee_id    TEXT NOT NULL,
        callee_name  TEXT NOT NULL,
        line_number  INTEGER NOT NULL,
        is_resolved  INTEGER NOT NULL,
        PRIMARY KEY (caller_id, line_number)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_calls_callee_id ON calls(callee_id)",
    r#"
    CREATE TABLE IF NOT EXISTS flows (
        function_id        TEXT NOT NULL,
        source_id           TEXT NOT NULL,
        target_id           TEXT NOT NULL,
        flow_kind           TEXT NOT NULL,
        line_number         INTEGER NOT NULL,
        source_expression   TEXT NOT NULL,
        confidence          REAL NOT NULL,
        PRIMARY KEY (function_id, target_id, line_number)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_flows_function_id ON flows(function_id)",
    r#"
    CREATE TABLE IF NOT EXISTS test_cases (
        id                TEXT PRIMARY KEY,
        name              TEXT NOT NULL,
        file_path         TEXT NOT NULL,
        framework         TEXT NOT NULL,
        assertions_count  INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS covers (
        test_id        TEXT NOT NULL,
        function_id    TEXT NOT NULL,
        coverage_kind  TEXT NOT NULL,
        confidence     REAL NOT NULL,
        PRIMARY KEY (test_id, function_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_covers_function_id ON covers(function_id)",
    r#"
    CREATE TABLE IF NOT EXISTS partial_ingest (
        subsystem   TEXT PRIMARY KEY,
        started_at  INTEGER NOT NULL
    )
    "#,
];

/// Creates every table, uniqueness constraint, and index. Idempotent — safe
/// to call at the start of every run.
pub fn install_schema(conn: &Connection) -> Result<(), StorageError> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute_batch(statement).map_err(|e| {
            tracing::error!(error = %e, "failed to install schema statement");
            StorageError::Schema { message: e.to_string() }
        })?;
    }
    Ok(())
}
