//! The five core operations (`ingest`, `map-tests`, `pipeline`, `stats`,
//! `purge`) wired together against the [`GraphWriter`]/[`GraphReader`]
//! traits rather than a concrete store, each phase running in a strict
//! order: every function in the subsystem is upserted before any `CALLS`
//! edge referencing it.

use std::path::Path;

use sentinel_core::config::PreprocessingConfig;
use sentinel_core::errors::StorageError;
use sentinel_core::events::types::{
    IngestCompleteEvent, IngestProgressEvent, IngestStartedEvent, IngestStats, IngestWarningEvent,
};
use sentinel_core::traits::storage::{GraphReader, GraphStats, GraphWriter};
use sentinel_core::SentinelEventHandler;

use crate::call_graph::{CallGraphBuilder, CallGraphStats};
use crate::test_mapper;

fn subsystem_name_of(subsystem_path: &Path) -> String {
    subsystem_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub subsystem: String,
    pub files_parsed: usize,
    pub files_failed: usize,
    pub functions_ingested: usize,
    pub variables_ingested: usize,
    pub flows_ingested: usize,
    pub parse_warnings: usize,
    pub call_graph_stats: CallGraphStats,
}

/// `ingest <path>`: `path` is a subsystem's own root directory. Parser +
/// data-flow extraction run over every `.c` file beneath it via
/// `sentinel-parser`; calls are resolved against this subsystem's own
/// function set only — a name is looked up among all known FunctionNodes in
/// the subsystem, never across subsystems.
///
/// `events` receives started/progress/warning/complete notifications as the
/// ingest proceeds; pass `&sentinel_core::NullEventHandler` when the caller
/// has no use for them. Preprocessing is disabled; see
/// [`ingest_subsystem_with_preprocessing`] to run files through the external
/// preprocessor first.
pub fn ingest_subsystem<S: GraphWriter>(
    store: &S,
    subsystem_path: &Path,
    events: &dyn SentinelEventHandler,
) -> Result<IngestReport, StorageError> {
    ingest_subsystem_with_preprocessing(store, subsystem_path, events, &PreprocessingConfig::default())
}

/// Same as [`ingest_subsystem`], running every file through
/// `sentinel_parser::preprocessor::preprocess_file` first when
/// `preprocessing.is_enabled()`, translating extracted line numbers back to
/// their original source location via the resulting line map.
pub fn ingest_subsystem_with_preprocessing<S: GraphWriter>(
    store: &S,
    subsystem_path: &Path,
    events: &dyn SentinelEventHandler,
    preprocessing: &PreprocessingConfig,
) -> Result<IngestReport, StorageError> {
    events.on_ingest_started(&IngestStartedEvent {
        subsystem_root: subsystem_path.to_path_buf(),
    });
    tracing::info!(path = %subsystem_path.display(), "ingest started");

    let subsystem = subsystem_name_of(subsystem_path);
    let mut extraction =
        sentinel_parser::extract_from_subsystem_with_preprocessing(subsystem_path, preprocessing);
    // `sentinel_parser::extract_from_subsystem` tags each function with the
    // first path segment *below the path it was given*; since we pass the
    // subsystem's own root (not the kernel root above it), that tag is the
    // file's immediate subdirectory, not the subsystem name. Override it.
    for function in extraction.functions.iter_mut() {
        function.subsystem = subsystem.clone();
    }

    for warning in &extraction.warnings {
        tracing::warn!(%warning, "parse warning during ingest");
        events.on_ingest_warning(&IngestWarningEvent {
            message: warning.to_string(),
        });
    }

    store.upsert_functions(&extraction.functions)?;
    store.upsert_variables(&extraction.variables)?;
    store.upsert_flows(&extraction.flows)?;

    events.on_ingest_progress(&IngestProgressEvent {
        files_parsed: extraction.files_parsed,
        files_total: extraction.files_parsed + extraction.files_failed,
        functions_extracted: extraction.functions.len(),
        flows_extracted: extraction.flows.len(),
    });

    let (_, resolved_calls, call_graph_stats) =
        CallGraphBuilder::new().build(&extraction.functions, &extraction.calls);
    store.upsert_calls(&resolved_calls)?;

    let resolve_warnings = resolved_calls.iter().filter(|c| !c.is_resolved).count();
    let report = IngestReport {
        subsystem,
        files_parsed: extraction.files_parsed,
        files_failed: extraction.files_failed,
        functions_ingested: extraction.functions.len(),
        variables_ingested: extraction.variables.len(),
        flows_ingested: extraction.flows.len(),
        parse_warnings: extraction.warnings.len(),
        call_graph_stats,
    };

    tracing::info!(
        subsystem = %report.subsystem,
        files_parsed = report.files_parsed,
        functions = report.functions_ingested,
        "ingest complete"
    );
    events.on_ingest_complete(&IngestCompleteEvent {
        stats: IngestStats {
            files_parsed: report.files_parsed,
            files_failed: report.files_failed,
            functions_extracted: report.functions_ingested,
            calls_extracted: resolved_calls.len(),
            variables_extracted: report.variables_ingested,
            flows_extracted: report.flows_ingested,
            // Batching and retries happen inside the `GraphWriter`
            // implementation, which this trait boundary doesn't expose counts
            // for — the concrete store logs those itself at `warn!`.
            batches_written: 0,
            parse_warnings: report.parse_warnings,
            resolve_warnings,
            store_retries: 0,
        },
    });

    Ok(report)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMapReport {
    pub subsystem: String,
    pub tests_found: usize,
    pub covers_found: usize,
    pub unknown_framework_warnings: usize,
}

/// `map-tests <path>`.
pub fn map_tests_for_subsystem<S: GraphWriter + GraphReader>(
    store: &S,
    subsystem_path: &Path,
    events: &dyn SentinelEventHandler,
) -> Result<TestMapReport, StorageError> {
    let subsystem = subsystem_name_of(subsystem_path);
    tracing::info!(subsystem = %subsystem, "test mapping started");
    let known_functions = store.list_functions(&subsystem)?;
    let (tests, covers, warnings) = test_mapper::map_tests(subsystem_path, &known_functions);

    for warning in &warnings {
        tracing::warn!(%warning, "test-mapper warning");
        events.on_ingest_warning(&IngestWarningEvent {
            message: warning.to_string(),
        });
    }

    store.upsert_tests(&tests)?;
    store.upsert_covers(&covers)?;

    tracing::info!(
        subsystem = %subsystem,
        tests_found = tests.len(),
        covers_found = covers.len(),
        "test mapping complete"
    );
    Ok(TestMapReport {
        subsystem,
        tests_found: tests.len(),
        covers_found: covers.len(),
        unknown_framework_warnings: warnings.len(),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub ingest: IngestReport,
    pub test_map: TestMapReport,
    pub stats: GraphStats,
}

/// `pipeline <path>`: ingest, then map-tests, then stats.
pub fn run_pipeline<S: GraphWriter + GraphReader>(
    store: &S,
    subsystem_path: &Path,
    events: &dyn SentinelEventHandler,
) -> Result<PipelineReport, StorageError> {
    let ingest = ingest_subsystem(store, subsystem_path, events)?;
    let test_map = map_tests_for_subsystem(store, subsystem_path, events)?;
    let stats = store.stats()?;
    Ok(PipelineReport {
        ingest,
        test_map,
        stats,
    })
}

/// `purge <subsystem>` — a thin, named pass-through kept alongside the
/// other core operations so every command has a corresponding function here.
pub fn purge_subsystem<S: GraphWriter>(store: &S, subsystem: &str) -> Result<(), StorageError> {
    store.purge_subsystem(subsystem)
}
