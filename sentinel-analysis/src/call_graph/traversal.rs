//! Bounded breadth-first traversal: a `VecDeque` plus a visited set, taking
//! a `petgraph::Direction` parameter so the same walk serves both callers
//! and callees. Entry points are a configurable syscall-name regex, decided
//! by the impact analyzer, not this module.

use std::collections::VecDeque;

use petgraph::Direction;
use rustc_hash::FxHashSet;

use sentinel_core::types::identifiers::FunctionId;

use super::CallGraph;

/// One node discovered by the traversal, at its shortest distance from the
/// start node, with the predecessor that first reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub function_id: FunctionId,
    pub distance: usize,
    pub parent: FunctionId,
}

/// BFS from `start` over `direction` (`Incoming` = callers, `Outgoing` =
/// callees), capped at `max_depth` hops. `start` itself is never included.
///
/// Determinism: when two unvisited nodes at the same
/// BFS layer would both discover a third node on the next layer, the
/// lexicographically smaller label wins — so each layer's frontier is
/// processed in label-sorted order before advancing.
pub fn bfs_with_paths(
    graph: &CallGraph,
    start: &FunctionId,
    direction: Direction,
    max_depth: usize,
) -> Vec<PathEntry> {
    let Some(start_ix) = graph.node_index(start) else {
        return Vec::new();
    };

    let mut visited: FxHashSet<FunctionId> = FxHashSet::default();
    visited.insert(start.clone());
    let mut parents: Vec<(FunctionId, usize, FunctionId)> = Vec::new();

    let mut frontier = vec![start_ix];
    let mut depth = 0usize;

    while depth < max_depth && !frontier.is_empty() {
        depth += 1;

        let mut labeled: Vec<_> = frontier
            .iter()
            .map(|&ix| (graph.label(&graph.graph()[ix]), ix))
            .collect();
        labeled.sort_by(|a, b| a.0.cmp(&b.0));

        let mut next_frontier = Vec::new();
        for (_, ix) in labeled {
            let parent_id = graph.graph()[ix].clone();
            for neighbor in graph.graph().neighbors_directed(ix, direction) {
                let neighbor_id = graph.graph()[neighbor].clone();
                if visited.insert(neighbor_id.clone()) {
                    parents.push((neighbor_id, depth, parent_id.clone()));
                    next_frontier.push(neighbor);
                }
            }
        }
        frontier = next_frontier;
    }

    parents
        .into_iter()
        .map(|(function_id, distance, parent)| PathEntry {
            function_id,
            distance,
            parent,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_graph::CallGraphBuilder;
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

    fn resolved_call(caller: &FunctionRecord, callee: &FunctionRecord, line: u32) -> CallRecord {
        CallRecord {
            caller_id: caller.id.clone(),
            callee_id: callee.id.clone(),
            callee_name: callee.name.clone(),
            line_number: line,
            is_resolved: true,
        }
    }

    #[test]
    fn chain_depth_is_bounded_by_max_depth() {
        let sys_foo = function("sys_foo", 1);
        let foo_inner = function("foo_inner", 10);
        let foo_leaf = function("foo_leaf", 20);
        let calls = vec![
            resolved_call(&sys_foo, &foo_inner, 2),
            resolved_call(&foo_inner, &foo_leaf, 11),
        ];
        let builder = CallGraphBuilder::new();
        let graph = builder.from_resolved(&[sys_foo.clone(), foo_inner.clone(), foo_leaf.clone()], &calls);

        let callers = bfs_with_paths(&graph, &foo_leaf.id, Direction::Incoming, 3);
        assert_eq!(callers.len(), 2);
        let sys_entry = callers.iter().find(|p| p.function_id == sys_foo.id).unwrap();
        assert_eq!(sys_entry.distance, 2);

        let capped = bfs_with_paths(&graph, &foo_leaf.id, Direction::Incoming, 1);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].function_id, foo_inner.id);
    }

    #[test]
    fn tie_break_picks_lexicographically_smaller_parent() {
        // a and b both call shared at depth 1; shared calls target at depth 2.
        // Whichever of a/b sorts first by name becomes target's recorded
        // grandparent-path predecessor (here indirectly, via `shared`).
        let a = function("a_caller", 1);
        let b = function("b_caller", 2);
        let shared = function("shared", 3);
        let target = function("target", 4);
        let calls = vec![
            resolved_call(&a, &shared, 1),
            resolved_call(&b, &shared, 2),
            resolved_call(&shared, &target, 3),
        ];
        let builder = CallGraphBuilder::new();
        let graph = builder.from_resolved(
            &[a.clone(), b.clone(), shared.clone(), target.clone()],
            &calls,
        );

        let callers = bfs_with_paths(&graph, &target.id, Direction::Incoming, 3);
        let shared_entry = callers.iter().find(|p| p.function_id == shared.id).unwrap();
        assert_eq!(shared_entry.distance, 1);
        let a_entry = callers.iter().find(|p| p.function_id == a.id).unwrap();
        let b_entry = callers.iter().find(|p| p.function_id == b.id).unwrap();
        assert_eq!(a_entry.distance, 2);
        assert_eq!(b_entry.distance, 2);
    }
}
