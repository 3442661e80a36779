//! Node identity. Every id is a deterministic, formatted string so it is
//! stable across re-ingestion and directly usable as a SQLite primary key —
//! there is no surrogate integer id in the schema.

use std::fmt;

/// `"file_path::name::line_start"` — a `FunctionNode`'s identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(String);

impl FunctionId {
    pub fn new(file_path: &str, name: &str, line_start: u32) -> Self {
        Self(format!("{file_path}::{name}::{line_start}"))
    }

    /// A placeholder id for an unresolved callee — carries only a name.
    pub fn placeholder(callee_name: &str) -> Self {
        Self(format!("<placeholder>::{callee_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with("<placeholder>::")
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FunctionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// `"function_id::variable_name::line_declared"` — a `VariableNode`'s identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(String);

impl VariableId {
    pub fn new(function_id: &FunctionId, variable_name: &str, line_declared: u32) -> Self {
        Self(format!(
            "{}::{}::{}",
            function_id.as_str(),
            variable_name,
            line_declared
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VariableId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// `"test_file::test_name"` — a `TestCaseNode`'s identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestCaseId(String);

impl TestCaseId {
    pub fn new(test_file: &str, test_name: &str) -> Self {
        Self(format!("{test_file}::{test_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TestCaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_id_round_trips_fields() {
        let id = FunctionId::new("drivers/net/e1000.c", "e1000_probe", 120);
        assert_eq!(id.as_str(), "drivers/net/e1000.c::e1000_probe::120");
        assert!(!id.is_placeholder());
    }

    #[test]
    fn placeholder_is_flagged() {
        let id = FunctionId::placeholder("extern_lib_fn");
        assert!(id.is_placeholder());
    }

    #[test]
    fn variable_id_is_scoped_to_function() {
        let func = FunctionId::new("f.c", "f", 1);
        let var = VariableId::new(&func, "b", 3);
        assert_eq!(var.as_str(), "f.c::f::1::b::3");
    }
}
