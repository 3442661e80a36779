use sentinel_core::traits::storage::{GraphReader, GraphWriter};
use sentinel_core::types::identifiers::FunctionId;
use sentinel_core::types::records::{CallRecord, FunctionRecord};
use sentinel_storage::SentinelGraphStore;

fn function(name: &str, subsystem: &str, line: u32) -> FunctionRecord {
    FunctionRecord {
        id: FunctionId::new("f.c", name, line),
        name: name.to_string(),
        file_path: "f.c".to_string(),
        line_start: line,
        line_end: line + 1,
        is_static: false,
        is_inline: false,
        subsystem: subsystem.to_string(),
        return_type: None,
    }
}

#[test]
fn idempotent_ingest_leaves_counts_unchanged() {
    let store = SentinelGraphStore::open_in_memory(500).unwrap();
    let batch = vec![function("helper", "net", 1), function("caller", "net", 10)];

    store.upsert_functions(&batch).unwrap();
    let first = store.stats().unwrap();

    store.upsert_functions(&batch).unwrap();
    let second = store.stats().unwrap();

    assert_eq!(first.function_count, second.function_count);
    assert_eq!(first.function_count, 2);
}

#[test]
fn purge_cascade_removes_functions_and_outgoing_calls() {
    let store = SentinelGraphStore::open_in_memory(500).unwrap();
    let net_fn = function("helper", "net", 1);
    let fs_fn = function("other", "fs", 1);
    store.upsert_functions(&[net_fn.clone(), fs_fn.clone()]).unwrap();
    store
        .upsert_calls(&[CallRecord {
            caller_id: net_fn.id.clone(),
            callee_id: fs_fn.id.clone(),
            callee_name: fs_fn.name.clone(),
            line_number: 2,
            is_resolved: true,
        }])
        .unwrap();

    store.purge_subsystem("net").unwrap();

    assert!(store.get_function(&net_fn.id).unwrap().is_none());
    assert!(store.get_function(&fs_fn.id).unwrap().is_some());
    assert_eq!(store.list_calls("net").unwrap().len(), 0);
}

#[test]
fn unresolved_call_keeps_a_queryable_placeholder_target() {
    let store = SentinelGraphStore::open_in_memory(500).unwrap();
    let caller = function("caller", "net", 1);
    store.upsert_functions(&[caller.clone()]).unwrap();
    let placeholder_id = FunctionId::placeholder("extern_lib_fn");
    store
        .upsert_calls(&[CallRecord {
            caller_id: caller.id.clone(),
            callee_id: placeholder_id.clone(),
            callee_name: "extern_lib_fn".to_string(),
            line_number: 5,
            is_resolved: false,
        }])
        .unwrap();

    let calls = store.list_calls("net").unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].callee_id.is_placeholder());
    assert!(!calls[0].is_resolved);
}
