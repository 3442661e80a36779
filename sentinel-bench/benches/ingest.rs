//! Ingestion throughput across fixture sizes: parser extraction, call-graph
//! resolution, and the store-write path end to end.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

use sentinel_analysis::pipeline::ingest_subsystem;
use sentinel_bench::{generate_fixture, FixtureSize};
use sentinel_storage::SentinelGraphStore;

fn bench_ingest(c: &mut Criterion) {
    tracing_subscriber::fmt().try_init().ok();

    let mut group = c.benchmark_group("ingest_subsystem");
    group.sample_size(10);

    for size in [FixtureSize::Small, FixtureSize::Medium, FixtureSize::Large] {
        let dir = TempDir::new().expect("create temp dir");
        let fixture = generate_fixture(dir.path(), size);
        group.throughput(Throughput::Elements(fixture.function_count as u64));

        group.bench_with_input(
            BenchmarkId::new("ingest", format!("{:?}", size)),
            &fixture,
            |b, fixture| {
                b.iter(|| {
                    let store = SentinelGraphStore::open_in_memory(500).unwrap();
                    ingest_subsystem(&store, &fixture.root, &sentinel_core::NullEventHandler).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);
