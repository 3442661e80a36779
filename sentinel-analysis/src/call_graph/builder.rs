//! Two-phase call graph construction: phase 1 indexes every known function
//! by name, phase 2 resolves each call site against that index. C has no
//! overload resolution or DI container to consult, so phase 2 collapses to
//! one resolution rule: exactly one name match resolves the edge, anything
//! else — zero or several — targets a placeholder.

use rustc_hash::FxHashMap;

use sentinel_core::types::identifiers::FunctionId;
use sentinel_core::types::records::{CallRecord, FunctionRecord};

use super::CallGraph;

/// Outcome counters for one `build()` call, tracking resolved vs. placeholder
/// bookkeeping the pipeline reports as ingest stats).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallGraphStats {
    pub function_count: usize,
    pub call_count: usize,
    pub resolved_calls: usize,
    pub placeholder_calls: usize,
    pub ambiguous_calls: usize,
}

impl CallGraphStats {
    pub fn resolution_rate(&self) -> f64 {
        if self.call_count == 0 {
            return 1.0;
        }
        self.resolved_calls as f64 / self.call_count as f64
    }
}

#[derive(Default)]
pub struct CallGraphBuilder;

impl CallGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the graph and returns the call records with `callee_id`/
    /// `is_resolved` rewritten per the resolution rule — the caller
    /// (the ingest pipeline) upserts these, not the ones `sentinel-parser`
    /// produced, since the parser only ever sees one file at a time and
    /// cannot know whether a name is unique across the whole subsystem.
    pub fn build(
        &self,
        functions: &[FunctionRecord],
        raw_calls: &[CallRecord],
    ) -> (CallGraph, Vec<CallRecord>, CallGraphStats) {
        let mut graph = CallGraph::new();
        let mut name_index: FxHashMap<&str, Vec<&FunctionId>> = FxHashMap::default();

        for function in functions {
            name_index
                .entry(function.name.as_str())
                .or_default()
                .push(&function.id);
            graph.add_function(function.clone());
        }

        let mut resolved_calls = Vec::with_capacity(raw_calls.len());
        let mut stats = CallGraphStats {
            function_count: functions.len(),
            call_count: raw_calls.len(),
            ..Default::default()
        };

        for call in raw_calls {
            let candidates = name_index.get(call.callee_name.as_str());
            let (callee_id, is_resolved) = match candidates.map(|c| c.as_slice()) {
                Some([single]) => {
                    stats.resolved_calls += 1;
                    ((*single).clone(), true)
                }
                Some([]) | None => {
                    stats.placeholder_calls += 1;
                    (FunctionId::placeholder(&call.callee_name), false)
                }
                Some(_many) => {
                    stats.ambiguous_calls += 1;
                    (FunctionId::placeholder(&call.callee_name), false)
                }
            };

            graph.add_call(&call.caller_id, &callee_id, call.line_number);
            resolved_calls.push(CallRecord {
                caller_id: call.caller_id.clone(),
                callee_id,
                callee_name: call.callee_name.clone(),
                line_number: call.line_number,
                is_resolved,
            });
        }

        (graph, resolved_calls, stats)
    }

    /// Rebuilds a [`CallGraph`] from records already persisted (and thus
    /// already resolved) — used by the impact analyzer, which reads back
    /// from [`sentinel_core::traits::storage::GraphReader`] instead of
    /// holding the parser's output in memory.
    pub fn from_resolved(&self, functions: &[FunctionRecord], calls: &[CallRecord]) -> CallGraph {
        let mut graph = CallGraph::new();
        for function in functions {
            graph.add_function(function.clone());
        }
        for call in calls {
            graph.add_call(&call.caller_id, &call.callee_id, call.line_number);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn call(caller: &FunctionRecord, callee_name: &str, line: u32) -> CallRecord {
        CallRecord {
            caller_id: caller.id.clone(),
            callee_id: FunctionId::placeholder(callee_name),
            callee_name: callee_name.to_string(),
            line_number: line,
            is_resolved: false,
        }
    }

    #[test]
    fn unique_name_resolves_to_the_matching_function() {
        let helper = function("helper", 1);
        let caller = function("caller", 10);
        let raw = vec![call(&caller, "helper", 11)];
        let (_graph, resolved, stats) =
            CallGraphBuilder::new().build(&[helper.clone(), caller], &raw);

        assert_eq!(resolved[0].callee_id, helper.id);
        assert!(resolved[0].is_resolved);
        assert_eq!(stats.resolved_calls, 1);
        assert_eq!(stats.placeholder_calls, 0);
    }

    #[test]
    fn absent_callee_becomes_a_placeholder() {
        let caller = function("caller", 10);
        let raw = vec![call(&caller, "extern_lib_fn", 11)];
        let (_graph, resolved, stats) = CallGraphBuilder::new().build(&[caller], &raw);

        assert!(resolved[0].callee_id.is_placeholder());
        assert!(!resolved[0].is_resolved);
        assert_eq!(stats.placeholder_calls, 1);
    }

    #[test]
    fn two_definitions_of_the_same_name_are_ambiguous() {
        let a = function("dup", 1);
        let mut b = function("dup", 50);
        b.file_path = "g.c".to_string();
        b.id = FunctionId::new("g.c", "dup", 50);
        let caller = function("caller", 100);
        let raw = vec![call(&caller, "dup", 101)];
        let (_graph, resolved, stats) =
            CallGraphBuilder::new().build(&[a, b, caller], &raw);

        assert!(resolved[0].callee_id.is_placeholder());
        assert_eq!(stats.ambiguous_calls, 1);
    }
}
