//! The single writer thread: every ingest writer funnels through one
//! `rusqlite::Connection` owned by this thread, fed by a bounded channel.
//! A buffer-then-flush loop driven by `Flush`/`FlushSync`/`Shutdown` control
//! commands, with retry/backoff around transient SQLite busy errors.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rusqlite::Connection;

use sentinel_core::constants::{DEFAULT_CHANNEL_CAPACITY, MAX_STORE_RETRIES};
use sentinel_core::errors::StorageError;

use super::commands::BatchCommand;
use super::exec;

#[derive(Debug, Default, Clone)]
pub struct WriteStats {
    pub functions_written: usize,
    pub variables_written: usize,
    pub calls_written: usize,
    pub flows_written: usize,
    pub tests_written: usize,
    pub covers_written: usize,
    pub subsystems_purged: usize,
    pub batches_flushed: usize,
    pub retries: u32,
}

pub struct BatchWriter {
    tx: Sender<BatchCommand>,
    handle: Option<JoinHandle<Result<WriteStats, StorageError>>>,
}

impl BatchWriter {
    pub fn new(conn: Connection, batch_size: usize) -> Self {
        let (tx, rx) = bounded(DEFAULT_CHANNEL_CAPACITY);
        let handle = thread::Builder::new()
            .name("sentinel-batch-writer".to_string())
            .spawn(move || writer_loop(conn, rx, batch_size))
            .expect("failed to spawn batch writer thread");
        Self { tx, handle: Some(handle) }
    }

    pub fn send(&self, cmd: BatchCommand) -> Result<(), StorageError> {
        self.tx.send(cmd).map_err(|_| StorageError::ChannelDisconnected)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.send(BatchCommand::Flush)
    }

    /// Blocks until the writer thread confirms the current buffer has
    /// committed — used before reads that must observe just-written data.
    pub fn flush_sync(&self) -> Result<(), StorageError> {
        let (done_tx, done_rx) = std::sync::mpsc::sync_channel(0);
        self.send(BatchCommand::FlushSync(done_tx))?;
        done_rx.recv().map_err(|_| StorageError::ChannelDisconnected)
    }

    pub fn shutdown(mut self) -> Result<WriteStats, StorageError> {
        let _ = self.tx.send(BatchCommand::Shutdown);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| StorageError::Fatal {
                message: "batch writer thread panicked".to_string(),
            })?,
            None => Ok(WriteStats::default()),
        }
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(BatchCommand::Shutdown);
    }
}

fn writer_loop(
    mut conn: Connection,
    rx: Receiver<BatchCommand>,
    batch_size: usize,
) -> Result<WriteStats, StorageError> {
    const FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

    let mut buffer: Vec<BatchCommand> = Vec::with_capacity(batch_size);
    let mut stats = WriteStats::default();

    loop {
        match rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(BatchCommand::Shutdown) => {
                flush_with_retry(&mut conn, &mut buffer, &mut stats)?;
                break;
            }
            Ok(BatchCommand::Flush) => {
                flush_with_retry(&mut conn, &mut buffer, &mut stats)?;
            }
            Ok(BatchCommand::FlushSync(done_tx)) => {
                flush_with_retry(&mut conn, &mut buffer, &mut stats)?;
                let _ = done_tx.send(());
            }
            Ok(cmd) => {
                buffer.push(cmd);
                if buffer.len() >= batch_size {
                    flush_with_retry(&mut conn, &mut buffer, &mut stats)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !buffer.is_empty() {
                    flush_with_retry(&mut conn, &mut buffer, &mut stats)?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush_with_retry(&mut conn, &mut buffer, &mut stats)?;
                break;
            }
        }
    }

    Ok(stats)
}

/// Each batch is its own transaction; on failure it rolls back and is
/// retried up to `MAX_STORE_RETRIES` times with exponential backoff before
/// the error propagates and the pipeline aborts.
fn flush_with_retry(
    conn: &mut Connection,
    buffer: &mut Vec<BatchCommand>,
    stats: &mut WriteStats,
) -> Result<(), StorageError> {
    if buffer.is_empty() {
        return Ok(());
    }

    let mut attempt = 0;
    loop {
        match flush_buffer(conn, buffer, stats) {
            Ok(()) => return Ok(()),
            Err(e) if is_transient(&e) && attempt < MAX_STORE_RETRIES => {
                attempt += 1;
                stats.retries += 1;
                let backoff = Duration::from_millis(50 * 2u64.pow(attempt - 1));
                tracing::warn!(attempt, ?backoff, "retrying batch flush after transient store error");
                thread::sleep(backoff);
            }
            Err(e) if is_transient(&e) => {
                tracing::error!(attempts = attempt, error = %e, "batch flush exhausted its retry budget");
                return Err(StorageError::TransientExhausted {
                    attempts: attempt,
                    message: e.to_string(),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "batch flush failed with a non-transient store error");
                return Err(e);
            }
        }
    }
}

fn is_transient(err: &StorageError) -> bool {
    err.is_transient()
}

fn flush_buffer(
    conn: &mut Connection,
    buffer: &mut Vec<BatchCommand>,
    stats: &mut WriteStats,
) -> Result<(), StorageError> {
    let tx = conn.transaction().map_err(map_sqlite_err)?;

    for cmd in buffer.iter() {
        match cmd {
            BatchCommand::UpsertFunctions(rows) => {
                exec::upsert_functions(&tx, rows).map_err(map_sqlite_err)?;
                stats.functions_written += rows.len();
            }
            BatchCommand::UpsertVariables(rows) => {
                exec::upsert_variables(&tx, rows).map_err(map_sqlite_err)?;
                stats.variables_written += rows.len();
            }
            BatchCommand::UpsertCalls(rows) => {
                exec::upsert_calls(&tx, rows).map_err(map_sqlite_err)?;
                stats.calls_written += rows.len();
            }
            BatchCommand::UpsertFlows(rows) => {
                exec::upsert_flows(&tx, rows).map_err(map_sqlite_err)?;
                stats.flows_written += rows.len();
            }
            BatchCommand::UpsertTests(rows) => {
                exec::upsert_tests(&tx, rows).map_err(map_sqlite_err)?;
                stats.tests_written += rows.len();
            }
            BatchCommand::UpsertCovers(rows) => {
                exec::upsert_covers(&tx, rows).map_err(map_sqlite_err)?;
                stats.covers_written += rows.len();
            }
            BatchCommand::PurgeSubsystem(subsystem) => {
                exec::purge_subsystem(&tx, subsystem).map_err(map_sqlite_err)?;
                stats.subsystems_purged += 1;
            }
            BatchCommand::Flush | BatchCommand::FlushSync(_) | BatchCommand::Shutdown => {
                unreachable!("control commands are drained before reaching flush_buffer")
            }
        }
    }

    tx.commit().map_err(map_sqlite_err)?;
    stats.batches_flushed += 1;
    tracing::trace!(commands = buffer.len(), batches_flushed = stats.batches_flushed, "batch committed");
    buffer.clear();
    Ok(())
}

fn map_sqlite_err(e: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &e {
        if inner.code == rusqlite::ErrorCode::DatabaseBusy {
            return StorageError::Busy { attempt: 0, max_attempts: MAX_STORE_RETRIES };
        }
    }
    StorageError::Sqlite { message: e.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::install_schema;
    use sentinel_core::types::identifiers::FunctionId;
    use sentinel_core::types::records::FunctionRecord;

    fn function_row(name: &str) -> FunctionRecord {
        FunctionRecord {
            id: FunctionId::new("f.c", name, 1),
            name: name.to_string(),
            file_path: "f.c".to_string(),
            line_start: 1,
            line_end: 2,
            is_static: false,
            is_inline: false,
            subsystem: "demo".to_string(),
            return_type: None,
        }
    }

    #[test]
    fn flush_sync_makes_writes_visible() {
        let conn = Connection::open_in_memory().unwrap();
        install_schema(&conn).unwrap();
        let writer = BatchWriter::new(conn, 500);
        writer
            .send(BatchCommand::UpsertFunctions(vec![function_row("helper")]))
            .unwrap();
        writer.flush_sync().unwrap();
        let stats = writer.shutdown().unwrap();
        assert_eq!(stats.functions_written, 1);
        assert_eq!(stats.batches_flushed, 1);
    }

    #[test]
    fn shutdown_flushes_pending_buffer() {
        let conn = Connection::open_in_memory().unwrap();
        install_schema(&conn).unwrap();
        let writer = BatchWriter::new(conn, 500);
        writer
            .send(BatchCommand::UpsertFunctions(vec![function_row("a"), function_row("b")]))
            .unwrap();
        let stats = writer.shutdown().unwrap();
        assert_eq!(stats.functions_written, 2);
    }
}
