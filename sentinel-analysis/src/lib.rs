//! # sentinel-analysis
//!
//! Everything downstream of the persisted graph: the call-graph builder,
//! bounded-depth traversal, the impact analyzer, the test mapper,
//! the subsystem scanner, and the pipeline orchestrator.

pub mod call_graph;
pub mod impact;
pub mod pipeline;
pub mod scanner;
pub mod test_mapper;

pub use call_graph::CallGraph;
pub use impact::{
    analyze_function_impact, export_graph_slice, FunctionImpact, GraphSlice, GraphSliceEdge,
    ImpactNode, RiskLevel,
};
