use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use sentinel_core::traits::storage::GraphWriter;
use sentinel_core::types::identifiers::FunctionId;
use sentinel_core::types::records::FunctionRecord;
use sentinel_storage::SentinelGraphStore;

fn function_batch(subsystem: &str, count: usize) -> Vec<FunctionRecord> {
    (0..count)
        .map(|i| {
            let name = format!("fn_{i}");
            FunctionRecord {
                id: FunctionId::new("bench.c", &name, i as u32),
                name,
                file_path: "bench.c".to_string(),
                line_start: i as u32,
                line_end: i as u32 + 2,
                is_static: false,
                is_inline: false,
                subsystem: subsystem.to_string(),
                return_type: Some("int".to_string()),
            }
        })
        .collect()
}

fn bench_upsert_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("upsert_functions");
    for size in [100usize, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let batch = function_batch("bench", size);
            b.iter(|| {
                let store = SentinelGraphStore::open_in_memory(500).unwrap();
                store.upsert_functions(&batch).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_upsert_functions);
criterion_main!(benches);
