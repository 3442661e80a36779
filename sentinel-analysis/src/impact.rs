//! The impact analyzer: `analyze_function_impact` and the secondary
//! multi-hop/top-functions/export operations, all built on the same
//! [`CallGraph`] and bounded BFS traversal. The risk formula and the
//! syscall/coverage joins are this module's own — see `DESIGN.md`'s Open
//! Question entries for the concrete bucket thresholds chosen.

use petgraph::Direction;
use regex::Regex;
use rustc_hash::FxHashMap;

use sentinel_core::errors::AnalysisError;
use sentinel_core::types::identifiers::{FunctionId, TestCaseId};
use sentinel_core::types::records::{CoversRecord, FunctionRecord, TestCaseRecord};

use crate::call_graph::{bfs_with_paths, CallGraph};

/// One caller/callee/entry-point in an impact report: a resolved function
/// or a placeholder, at its shortest distance from the function under
/// analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactNode {
    pub function_id: FunctionId,
    pub name: String,
    pub distance: usize,
    pub is_placeholder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    fn from_bucket(bucket: usize) -> Self {
        match bucket {
            0 => Self::Low,
            1 => Self::Medium,
            2 => Self::High,
            _ => Self::Critical,
        }
    }

    fn raised_by(self, amount: usize) -> Self {
        Self::from_bucket((self as usize + amount).min(Self::Critical as usize))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Caller-count bucket feeding the risk formula's "logarithmic scaling"
/// — thresholds roughly double, chosen so a single caller never
/// pushes a function past `Low` on its own (Scenario A).
fn caller_count_bucket(count: usize) -> usize {
    match count {
        0..=2 => 0,
        3..=7 => 1,
        8..=20 => 2,
        _ => 3,
    }
}

/// Pre-joined `TestCase`/`COVERS` data for one or more subsystems. Built
/// once per analysis session and handed to `analyze_function_impact` so the
/// analyzer stays a pure function of its graph and coverage inputs.
pub struct CoverageIndex {
    direct: FxHashMap<FunctionId, Vec<TestCaseId>>,
    tests: FxHashMap<TestCaseId, TestCaseRecord>,
}

impl CoverageIndex {
    pub fn build(tests: &[TestCaseRecord], covers: &[CoversRecord]) -> Self {
        let mut direct: FxHashMap<FunctionId, Vec<TestCaseId>> = FxHashMap::default();
        for edge in covers {
            direct
                .entry(edge.function_id.clone())
                .or_default()
                .push(edge.test_id.clone());
        }
        let tests = tests.iter().map(|t| (t.id.clone(), t.clone())).collect();
        Self { direct, tests }
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    fn direct_tests(&self, function_id: &FunctionId) -> Vec<TestCaseRecord> {
        self.direct
            .get(function_id)
            .map(|ids| ids.iter().filter_map(|id| self.tests.get(id).cloned()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionImpact {
    pub function: FunctionRecord,
    pub direct_callers: Vec<ImpactNode>,
    pub indirect_callers: Vec<ImpactNode>,
    pub direct_callees: Vec<ImpactNode>,
    pub indirect_callees: Vec<ImpactNode>,
    pub syscall_entry_points: Vec<ImpactNode>,
    pub covering_tests_direct: Vec<TestCaseRecord>,
    pub covering_tests_indirect: Vec<TestCaseRecord>,
    pub risk_level: RiskLevel,
    /// Set when a caller or callee chain extends past `max_depth` — the
    /// counts above are still exact for `<= max_depth`, just not complete.
    pub truncated: bool,
}

fn to_impact_node(graph: &CallGraph, entry: &crate::call_graph::PathEntry) -> ImpactNode {
    ImpactNode {
        function_id: entry.function_id.clone(),
        name: graph.label(&entry.function_id),
        distance: entry.distance,
        is_placeholder: entry.function_id.is_placeholder(),
    }
}

fn sorted(mut nodes: Vec<ImpactNode>) -> Vec<ImpactNode> {
    nodes.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.name.cmp(&b.name)));
    nodes
}

/// Full, uncapped BFS (cap = node count, which bounds any shortest path)
/// so direct/indirect/truncated can all be read off one traversal instead
/// of re-walking the graph per concern.
fn full_bfs(graph: &CallGraph, start: &FunctionId, direction: Direction) -> Vec<crate::call_graph::PathEntry> {
    let cap = graph.function_count().max(1) + 1;
    bfs_with_paths(graph, start, direction, cap)
}

fn validate_depth(requested: usize) -> Result<usize, AnalysisError> {
    if requested == 0 || requested > sentinel_core::constants::HARD_MAX_DEPTH {
        return Err(AnalysisError::InvalidDepth {
            requested,
            hard_max: sentinel_core::constants::HARD_MAX_DEPTH,
        });
    }
    Ok(requested)
}

/// `analyze_function_impact(name, max_depth, file_path) -> FunctionImpact`.
/// When two or more functions share `name`, pass `file_path` to
/// disambiguate; otherwise ambiguity is reported back to the caller as an
/// error.
pub fn analyze_function_impact(
    graph: &CallGraph,
    coverage: &CoverageIndex,
    syscall_regex: &Regex,
    name: &str,
    max_depth: usize,
    file_path: Option<&str>,
) -> Result<FunctionImpact, AnalysisError> {
    let max_depth = validate_depth(max_depth)?;
    let id = graph.resolve_name(name, file_path)?.clone();
    let function = graph
        .function(&id)
        .cloned()
        .expect("resolve_name only returns ids inserted via add_function");

    let all_callers = full_bfs(graph, &id, Direction::Incoming);
    let all_callees = full_bfs(graph, &id, Direction::Outgoing);

    let truncated = all_callers.iter().any(|e| e.distance > max_depth)
        || all_callees.iter().any(|e| e.distance > max_depth);

    let in_range = |entries: &[crate::call_graph::PathEntry], lo: usize, hi: usize| -> Vec<ImpactNode> {
        sorted(
            entries
                .iter()
                .filter(|e| e.distance >= lo && e.distance <= hi)
                .map(|e| to_impact_node(graph, e))
                .collect(),
        )
    };

    let direct_callers = in_range(&all_callers, 1, 1);
    let indirect_callers = in_range(&all_callers, 2, max_depth);
    let direct_callees = in_range(&all_callees, 1, 1);
    let indirect_callees = in_range(&all_callees, 2, max_depth);

    let syscall_entry_points = sorted(
        all_callers
            .iter()
            .filter(|e| e.distance <= max_depth)
            .map(|e| to_impact_node(graph, e))
            .filter(|n| syscall_regex.is_match(&n.name))
            .collect(),
    );

    let covering_tests_direct = {
        let mut tests = coverage.direct_tests(&id);
        tests.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        tests
    };
    let direct_test_ids: std::collections::HashSet<_> =
        covering_tests_direct.iter().map(|t| t.id.clone()).collect();

    let mut indirect_map: FxHashMap<TestCaseId, TestCaseRecord> = FxHashMap::default();
    for caller in direct_callers.iter().chain(indirect_callers.iter()) {
        for test in coverage.direct_tests(&caller.function_id) {
            if !direct_test_ids.contains(&test.id) {
                indirect_map.insert(test.id.clone(), test);
            }
        }
    }
    let mut covering_tests_indirect: Vec<_> = indirect_map.into_values().collect();
    covering_tests_indirect.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

    let mut risk_level = RiskLevel::from_bucket(caller_count_bucket(
        direct_callers.len() + indirect_callers.len(),
    ));
    // The zero-coverage bump only applies once the subsystem has actually
    // been through the test mapper — an empty `CoverageIndex` means
    // "not analyzed", not "analyzed and uncovered", and must not be
    // penalized the same way.
    if !coverage.is_empty() && covering_tests_direct.is_empty() && covering_tests_indirect.is_empty() {
        risk_level = risk_level.raised_by(1);
    }
    if !syscall_entry_points.is_empty() {
        risk_level = risk_level.raised_by(1);
    }

    Ok(FunctionImpact {
        function,
        direct_callers,
        indirect_callers,
        direct_callees,
        indirect_callees,
        syscall_entry_points,
        covering_tests_direct,
        covering_tests_indirect,
        risk_level,
        truncated,
    })
}

/// `get_callers_multi_hop` — the same traversal `analyze_function_impact`
/// uses, exposed standalone for the CVE/log-coverage analyzers.
pub fn get_callers_multi_hop(
    graph: &CallGraph,
    function_id: &FunctionId,
    max_depth: usize,
) -> Result<Vec<ImpactNode>, AnalysisError> {
    let max_depth = validate_depth(max_depth)?;
    Ok(sorted(
        bfs_with_paths(graph, function_id, Direction::Incoming, max_depth)
            .iter()
            .map(|e| to_impact_node(graph, e))
            .collect(),
    ))
}

pub fn get_callees_multi_hop(
    graph: &CallGraph,
    function_id: &FunctionId,
    max_depth: usize,
) -> Result<Vec<ImpactNode>, AnalysisError> {
    let max_depth = validate_depth(max_depth)?;
    Ok(sorted(
        bfs_with_paths(graph, function_id, Direction::Outgoing, max_depth)
            .iter()
            .map(|e| to_impact_node(graph, e))
            .collect(),
    ))
}

/// `top_functions(subsystem, min_callers, limit)` — sorted by
/// in-degree descending, ties broken by name for determinism.
pub fn top_functions(
    graph: &CallGraph,
    subsystem: Option<&str>,
    min_callers: usize,
    limit: usize,
) -> Vec<(FunctionRecord, usize)> {
    let mut ranked: Vec<_> = graph
        .all_function_ids()
        .filter_map(|id| {
            let function = graph.function(id)?;
            if let Some(s) = subsystem {
                if function.subsystem != s {
                    return None;
                }
            }
            let callers = graph.in_degree(id);
            (callers >= min_callers).then(|| (function.clone(), callers))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphSliceEdge {
    pub caller: FunctionId,
    pub callee: FunctionId,
    pub line_number: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphSlice {
    pub nodes: Vec<ImpactNode>,
    pub edges: Vec<GraphSliceEdge>,
}

/// `export_graph_slice(function_id, max_depth, direction)` — a
/// deterministic node/edge list for an external visualization renderer.
/// Never performs I/O.
pub fn export_graph_slice(
    graph: &CallGraph,
    function_id: &FunctionId,
    max_depth: usize,
    direction: Direction,
) -> Result<GraphSlice, AnalysisError> {
    let max_depth = validate_depth(max_depth)?;
    let mut nodes = vec![ImpactNode {
        function_id: function_id.clone(),
        name: graph.label(function_id),
        distance: 0,
        is_placeholder: function_id.is_placeholder(),
    }];
    nodes.extend(
        bfs_with_paths(graph, function_id, direction, max_depth)
            .into_iter()
            .map(|e| to_impact_node(graph, &e)),
    );
    let included: std::collections::HashSet<_> = nodes.iter().map(|n| n.function_id.clone()).collect();

    let mut edges = Vec::new();
    if let Some(start_ix) = graph.node_index(function_id) {
        let mut seen_edges = std::collections::HashSet::new();
        for node in &nodes {
            let Some(ix) = graph.node_index(&node.function_id) else { continue };
            for edge_ref in graph.graph().edges_directed(ix, direction) {
                use petgraph::visit::EdgeRef;
                let (from, to) = match direction {
                    Direction::Outgoing => (edge_ref.source(), edge_ref.target()),
                    Direction::Incoming => (edge_ref.target(), edge_ref.source()),
                };
                let from_id = graph.graph()[from].clone();
                let to_id = graph.graph()[to].clone();
                if included.contains(&from_id) && included.contains(&to_id) {
                    let key = (from_id.clone(), to_id.clone(), edge_ref.weight().line_number);
                    if seen_edges.insert(key) {
                        edges.push(GraphSliceEdge {
                            caller: from_id,
                            callee: to_id,
                            line_number: edge_ref.weight().line_number,
                        });
                    }
                }
            }
        }
        let _ = start_ix;
    }
    edges.sort_by(|a, b| {
        a.caller
            .as_str()
            .cmp(b.caller.as_str())
            .then_with(|| a.callee.as_str().cmp(b.callee.as_str()))
            .then_with(|| a.line_number.cmp(&b.line_number))
    });

    Ok(GraphSlice { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_graph::CallGraphBuilder;
    use sentinel_core::constants::DEFAULT_SYSCALL_PREFIXES;
    use sentinel_core::types::identifiers::FunctionId;
    use sentinel_core::types::records::{CallRecord, CoverageKind};

    fn function(name: &str, line: u32, subsystem: &str) -> FunctionRecord {
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

    fn resolved_call(caller: &FunctionRecord, callee: &FunctionRecord, line: u32) -> CallRecord {
        CallRecord {
            caller_id: caller.id.clone(),
            callee_id: callee.id.clone(),
            callee_name: callee.name.clone(),
            line_number: line,
            is_resolved: true,
        }
    }

    fn syscall_regex() -> Regex {
        let pattern = format!("^({})", DEFAULT_SYSCALL_PREFIXES.join("|"));
        Regex::new(&pattern).unwrap()
    }

    #[test]
    fn scenario_a_leaf_helper() {
        let helper = function("helper", 1, "net");
        let caller = function("caller", 10, "net");
        let calls = vec![resolved_call(&caller, &helper, 11)];
        let graph = CallGraphBuilder::new().from_resolved(&[helper.clone(), caller.clone()], &calls);
        let coverage = CoverageIndex::build(&[], &[]);

        let impact =
            analyze_function_impact(&graph, &coverage, &syscall_regex(), "helper", 3, None).unwrap();
        assert_eq!(impact.direct_callers.len(), 1);
        assert_eq!(impact.direct_callers[0].function_id, caller.id);
        assert!(impact.indirect_callers.is_empty());
        assert_eq!(impact.risk_level, RiskLevel::Low);
    }

    #[test]
    fn scenario_b_syscall_reachability() {
        let sys_foo = function("sys_foo", 1, "net");
        let foo_inner = function("foo_inner", 10, "net");
        let foo_leaf = function("foo_leaf", 20, "net");
        let calls = vec![
            resolved_call(&sys_foo, &foo_inner, 2),
            resolved_call(&foo_inner, &foo_leaf, 11),
        ];
        let graph = CallGraphBuilder::new().from_resolved(
            &[sys_foo.clone(), foo_inner.clone(), foo_leaf.clone()],
            &calls,
        );
        let coverage = CoverageIndex::build(&[], &[]);

        let impact =
            analyze_function_impact(&graph, &coverage, &syscall_regex(), "foo_leaf", 3, None).unwrap();
        assert_eq!(impact.syscall_entry_points.len(), 1);
        assert_eq!(impact.syscall_entry_points[0].function_id, sys_foo.id);
        assert_eq!(impact.syscall_entry_points[0].distance, 2);
        assert_eq!(impact.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn scenario_c_indirect_coverage_does_not_double_bump() {
        let foo_inner = function("foo_inner", 10, "net");
        let foo_leaf = function("foo_leaf", 20, "net");
        let calls = vec![resolved_call(&foo_inner, &foo_leaf, 11)];
        let graph =
            CallGraphBuilder::new().from_resolved(&[foo_inner.clone(), foo_leaf.clone()], &calls);

        let test_a = TestCaseRecord {
            id: TestCaseId::new("t.c", "test_A"),
            name: "test_A".to_string(),
            file_path: "t.c".to_string(),
            framework: "kunit".to_string(),
            assertions_count: 1,
        };
        let covers = vec![CoversRecord {
            test_id: test_a.id.clone(),
            function_id: foo_inner.id.clone(),
            coverage_kind: CoverageKind::Direct,
            confidence: 1.0,
        }];
        let coverage = CoverageIndex::build(&[test_a.clone()], &covers);

        let impact =
            analyze_function_impact(&graph, &coverage, &syscall_regex(), "foo_leaf", 3, None).unwrap();
        assert!(impact.covering_tests_direct.is_empty());
        assert_eq!(impact.covering_tests_indirect, vec![test_a]);
        assert_eq!(impact.risk_level, RiskLevel::Low);
    }

    #[test]
    fn scenario_d_unresolved_callee_is_a_queryable_placeholder() {
        let caller = function("caller", 1, "net");
        let raw_calls = vec![CallRecord {
            caller_id: caller.id.clone(),
            callee_id: FunctionId::placeholder("extern_lib_fn"),
            callee_name: "extern_lib_fn".to_string(),
            line_number: 5,
            is_resolved: false,
        }];
        let (graph, resolved, _stats) =
            CallGraphBuilder::new().build(&[caller.clone()], &raw_calls);
        assert!(!resolved[0].is_resolved);
        let coverage = CoverageIndex::build(&[], &[]);

        let impact =
            analyze_function_impact(&graph, &coverage, &syscall_regex(), "caller", 1, None).unwrap();
        assert_eq!(impact.direct_callees.len(), 1);
        assert!(impact.direct_callees[0].is_placeholder);
        assert_eq!(impact.direct_callees[0].name, "extern_lib_fn");
    }

    #[test]
    fn ambiguous_name_is_rejected() {
        let mut b = function("dup", 50, "net");
        b.file_path = "g.c".to_string();
        b.id = FunctionId::new("g.c", "dup", 50);
        let a = function("dup", 1, "net");
        let graph = CallGraphBuilder::new().from_resolved(&[a, b], &[]);
        let coverage = CoverageIndex::build(&[], &[]);

        let err = analyze_function_impact(&graph, &coverage, &syscall_regex(), "dup", 3, None).unwrap_err();
        assert!(matches!(err, AnalysisError::AmbiguousFunction { .. }));
    }

    #[test]
    fn ambiguous_name_resolves_when_file_path_narrows_it_to_one() {
        let mut b = function("dup", 50, "net");
        b.file_path = "g.c".to_string();
        b.id = FunctionId::new("g.c", "dup", 50);
        let a = function("dup", 1, "net");
        let graph = CallGraphBuilder::new().from_resolved(&[a, b], &[]);
        let coverage = CoverageIndex::build(&[], &[]);

        let impact =
            analyze_function_impact(&graph, &coverage, &syscall_regex(), "dup", 3, Some("g.c")).unwrap();
        assert_eq!(impact.function.file_path, "g.c");
    }

    #[test]
    fn file_path_matching_no_candidate_is_still_ambiguous() {
        let mut b = function("dup", 50, "net");
        b.file_path = "g.c".to_string();
        b.id = FunctionId::new("g.c", "dup", 50);
        let a = function("dup", 1, "net");
        let graph = CallGraphBuilder::new().from_resolved(&[a, b], &[]);
        let coverage = CoverageIndex::build(&[], &[]);

        let err =
            analyze_function_impact(&graph, &coverage, &syscall_regex(), "dup", 3, Some("missing.c"))
                .unwrap_err();
        assert!(matches!(err, AnalysisError::AmbiguousFunction { .. }));
    }

    #[test]
    fn top_functions_ranks_by_in_degree_then_name() {
        let popular = function("popular", 1, "net");
        let lonely = function("lonely", 2, "net");
        let a = function("a_caller", 3, "net");
        let b = function("b_caller", 4, "net");
        let calls = vec![
            resolved_call(&a, &popular, 5),
            resolved_call(&b, &popular, 6),
        ];
        let graph = CallGraphBuilder::new().from_resolved(
            &[popular.clone(), lonely, a, b],
            &calls,
        );
        let ranked = top_functions(&graph, None, 1, 10);
        assert_eq!(ranked[0].0.id, popular.id);
        assert_eq!(ranked[0].1, 2);
    }

    proptest::proptest! {
        /// For a straight-line call chain `f0 -> f1 -> ... -> f(len-1)`, the
        /// number of callers `analyze_function_impact` reports for the tail
        /// function is always `min(len - 1, max_depth)`, and `truncated` is
        /// set exactly when the chain is longer than `max_depth` reaches.
        #[test]
        fn caller_count_never_exceeds_bounded_depth(len in 1usize..15, max_depth in 1usize..=10) {
            let functions: Vec<FunctionRecord> =
                (0..len).map(|i| function(&format!("f{i}"), (i + 1) as u32, "net")).collect();
            let calls: Vec<CallRecord> = functions
                .windows(2)
                .map(|pair| resolved_call(&pair[0], &pair[1], 100))
                .collect();
            let graph = CallGraphBuilder::new().from_resolved(&functions, &calls);
            let coverage = CoverageIndex::build(&[], &[]);
            let tail_name = functions.last().unwrap().name.clone();

            let impact = analyze_function_impact(&graph, &coverage, &syscall_regex(), &tail_name, max_depth, None)
                .unwrap();

            let chain_depth = len - 1;
            let expected_callers = chain_depth.min(max_depth);
            proptest::prop_assert_eq!(
                impact.direct_callers.len() + impact.indirect_callers.len(),
                expected_callers
            );
            proptest::prop_assert_eq!(impact.truncated, chain_depth > max_depth);
        }
    }
}
