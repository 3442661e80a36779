//! Row-shaped DTOs that cross the `sentinel-storage` boundary. These mirror
//! the node/edge schema one-to-one; `sentinel-parser` and `sentinel-analysis`
//! build them, `sentinel-storage` persists them.

use crate::types::identifiers::{FunctionId, TestCaseId, VariableId};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    pub id: FunctionId,
    pub name: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub is_static: bool,
    pub is_inline: bool,
    pub subsystem: String,
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Parameter,
    Local,
    Static,
    Global,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parameter => "parameter",
            Self::Local => "local",
            Self::Static => "static",
            Self::Global => "global",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub id: VariableId,
    pub function_id: FunctionId,
    pub name: String,
    pub type_string: Option<String>,
    pub kind: VariableKind,
    pub is_pointer: bool,
    pub declaration_line: u32,
    pub initial_value_expr: Option<String>,
}

/// A `CALLS` edge. `callee_name` is always populated; `callee_id` is
/// `Some` only when resolution succeeded, in which case `is_resolved` mirrors
/// that — otherwise the edge targets a placeholder `FunctionId`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub caller_id: FunctionId,
    pub callee_id: FunctionId,
    pub callee_name: String,
    pub line_number: u32,
    pub is_resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Assignment,
    Initialization,
    ParameterBindingLocal,
    ReturnValue,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Initialization => "initialization",
            Self::ParameterBindingLocal => "parameter_binding_local",
            Self::ReturnValue => "return_value",
        }
    }
}

/// A `FLOWS_TO` edge. `source_id`/`target_id` always share one
/// `function_id` — cross-function flow must never be constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFlowRecord {
    pub function_id: FunctionId,
    pub source_id: VariableId,
    pub target_id: VariableId,
    pub flow_kind: FlowKind,
    pub line_number: u32,
    pub source_expression: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseRecord {
    pub id: TestCaseId,
    pub name: String,
    pub file_path: String,
    pub framework: String,
    pub assertions_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageKind {
    Direct,
    Indirect,
}

impl CoverageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Indirect => "indirect",
        }
    }
}

/// A `COVERS` edge. The test mapper only ever emits `Direct`; `Indirect`
/// is computed on demand by the impact analyzer and never persisted as such.
#[derive(Debug, Clone, PartialEq)]
pub struct CoversRecord {
    pub test_id: TestCaseId,
    pub function_id: FunctionId,
    pub coverage_kind: CoverageKind,
    pub confidence: f64,
}
