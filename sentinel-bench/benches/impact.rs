//! Impact-analysis throughput against pre-built call graphs of growing
//! size, isolating the BFS + risk computation from parsing/ingestion.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use sentinel_analysis::call_graph::CallGraphBuilder;
use sentinel_analysis::impact::CoverageIndex;
use sentinel_analysis::{analyze_function_impact, CallGraph};
use sentinel_core::constants::DEFAULT_SYSCALL_PREFIXES;
use sentinel_core::types::identifiers::FunctionId;
use sentinel_core::types::records::{CallRecord, FunctionRecord};

fn function(name: &str, line: u32) -> FunctionRecord {
    FunctionRecord {
        id: FunctionId::new("f.c", name, line),
        name: name.to_string(),
        file_path: "f.c".to_string(),
        line_start: line,
        line_end: line + 1,
        is_static: false,
        is_inline: false,
        subsystem: "net".to_string(),
        return_type: None,
    }
}

/// `chain_count` independent chains of length `chain_depth`, all
/// funneling into a single shared `hub` — exercises both deep BFS and a
/// high-in-degree node in the same graph.
fn build_graph(chain_count: usize, chain_depth: usize) -> CallGraph {
    let hub = function("hub", 0);
    let mut functions = vec![hub.clone()];
    let mut calls = Vec::new();

    for chain in 0..chain_count {
        let mut prev = hub.clone();
        for depth in 0..chain_depth {
            let node = function(&format!("c{chain}_d{depth}"), (chain * chain_depth + depth + 1) as u32);
            calls.push(CallRecord {
                caller_id: node.id.clone(),
                callee_id: prev.id.clone(),
                callee_name: prev.name.clone(),
                line_number: depth as u32,
                is_resolved: true,
            });
            functions.push(node.clone());
            prev = node;
        }
    }

    CallGraphBuilder::new().from_resolved(&functions, &calls)
}

fn bench_analyze(c: &mut Criterion) {
    tracing_subscriber::fmt().try_init().ok();

    let mut group = c.benchmark_group("analyze_function_impact");
    let coverage = CoverageIndex::build(&[], &[]);
    let pattern = format!("^({})", DEFAULT_SYSCALL_PREFIXES.join("|"));
    let syscall_regex = regex::Regex::new(&pattern).unwrap();

    for (chain_count, chain_depth) in [(10, 3), (100, 5), (1_000, 5)] {
        let graph = build_graph(chain_count, chain_depth);
        group.bench_with_input(
            BenchmarkId::new("hub", format!("{chain_count}x{chain_depth}")),
            &graph,
            |b, graph| {
                b.iter(|| {
                    analyze_function_impact(graph, &coverage, &syscall_regex, "hub", 5, None).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
