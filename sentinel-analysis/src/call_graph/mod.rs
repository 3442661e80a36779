//! The in-memory call graph (`CALLS` edges) and the operations built
//! directly on top of it: construction with name resolution (`builder`)
//! and bounded BFS traversal (`traversal`).

pub mod builder;
pub mod traversal;

pub use builder::{CallGraphBuilder, CallGraphStats};
pub use traversal::{bfs_with_paths, PathEntry};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Directed;
use rustc_hash::FxHashMap;

use sentinel_core::errors::AnalysisError;
use sentinel_core::types::identifiers::FunctionId;
use sentinel_core::types::records::FunctionRecord;

/// Weight carried by a `CALLS` edge: just enough to answer impact queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub line_number: u32,
}

/// A resolved call graph over one or more subsystems. Nodes are
/// [`FunctionId`]s; placeholder targets are nodes like any other,
/// just without an entry in `functions`.
pub struct CallGraph {
    graph: StableGraph<FunctionId, CallEdge, Directed>,
    index: FxHashMap<FunctionId, NodeIndex>,
    functions: FxHashMap<FunctionId, FunctionRecord>,
    name_index: FxHashMap<String, Vec<FunctionId>>,
}

impl CallGraph {
    pub(crate) fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            index: FxHashMap::default(),
            functions: FxHashMap::default(),
            name_index: FxHashMap::default(),
        }
    }

    pub(crate) fn node_index_or_insert(&mut self, id: &FunctionId) -> NodeIndex {
        if let Some(&ix) = self.index.get(id) {
            return ix;
        }
        let ix = self.graph.add_node(id.clone());
        self.index.insert(id.clone(), ix);
        ix
    }

    pub(crate) fn add_function(&mut self, record: FunctionRecord) {
        let ix = self.node_index_or_insert(&record.id);
        debug_assert_eq!(self.graph[ix], record.id);
        self.name_index
            .entry(record.name.clone())
            .or_default()
            .push(record.id.clone());
        self.functions.insert(record.id.clone(), record);
    }

    pub(crate) fn add_call(&mut self, caller: &FunctionId, callee: &FunctionId, line_number: u32) {
        let from = self.node_index_or_insert(caller);
        let to = self.node_index_or_insert(callee);
        self.graph.add_edge(from, to, CallEdge { line_number });
    }

    pub fn graph(&self) -> &StableGraph<FunctionId, CallEdge, Directed> {
        &self.graph
    }

    pub fn node_index(&self, id: &FunctionId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn function(&self, id: &FunctionId) -> Option<&FunctionRecord> {
        self.functions.get(id)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// The human-readable label for a node: its function name if known,
    /// otherwise the callee name carried by a placeholder id.
    pub fn label(&self, id: &FunctionId) -> String {
        match self.functions.get(id) {
            Some(f) => f.name.clone(),
            None => id
                .as_str()
                .rsplit("::")
                .next()
                .unwrap_or(id.as_str())
                .to_string(),
        }
    }

    /// Resolve a bare function name to its id: zero matches is
    /// `FunctionNotFound`, more than one is `AmbiguousFunction` unless
    /// `file_path` narrows the candidates down to exactly one.
    pub fn resolve_name(
        &self,
        name: &str,
        file_path: Option<&str>,
    ) -> Result<&FunctionId, AnalysisError> {
        let candidates: &[FunctionId] = match self.name_index.get(name) {
            None => &[],
            Some(ids) => ids,
        };

        if candidates.is_empty() {
            return Err(AnalysisError::FunctionNotFound {
                name: name.to_string(),
            });
        }

        if let Some(single) = candidates.first().filter(|_| candidates.len() == 1) {
            return Ok(single);
        }

        let Some(file_path) = file_path else {
            return Err(AnalysisError::AmbiguousFunction {
                name: name.to_string(),
                candidate_count: candidates.len(),
            });
        };

        let matching: Vec<&FunctionId> = candidates
            .iter()
            .filter(|id| {
                self.functions
                    .get(id)
                    .is_some_and(|f| f.file_path == file_path)
            })
            .collect();

        match matching.as_slice() {
            [single] => Ok(*single),
            _ => Err(AnalysisError::AmbiguousFunction {
                name: name.to_string(),
                candidate_count: matching.len().max(1),
            }),
        }
    }

    /// In-degree (number of distinct callers) for `top_functions`.
    pub fn in_degree(&self, id: &FunctionId) -> usize {
        self.node_index(id)
            .map(|ix| {
                self.graph
                    .neighbors_directed(ix, petgraph::Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn all_function_ids(&self) -> impl Iterator<Item = &FunctionId> {
        self.functions.keys()
    }
}
