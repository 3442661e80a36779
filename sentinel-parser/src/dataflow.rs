//! Variable and intra-procedural data-flow extraction.
//!
//! Operates on the same `tree_sitter::Tree` Module A already parsed (the
//! caller re-walks a function body rather than re-parsing the file). All
//! flows stay inside one function — a rule enforced structurally here, not
//! just documented, because every `VariableId` is built from one `FunctionId`.

use sentinel_core::constants::{MAX_FLOW_SOURCES_PER_EXPRESSION, RETURN_VALUE_VARIABLE};
use sentinel_core::types::collections::{FxHashMap, FxHashSet};
use sentinel_core::types::identifiers::{FunctionId, VariableId};
use sentinel_core::types::records::{DataFlowRecord, FlowKind, VariableKind, VariableRecord};
use tree_sitter::Node;

/// Lexical scope stack: innermost-first lookup of `name -> VariableId`, one
/// frame per compound block (prefers the innermost active declaration).
/// Also tracks each variable's declared kind and, for parameters, whether
/// they have been referenced as a flow source yet — needed to tell a
/// parameter's first use apart from every later one.
#[derive(Default)]
struct ScopeStack {
    frames: Vec<FxHashMap<String, VariableId>>,
    kinds: FxHashMap<VariableId, VariableKind>,
    parameters: FxHashSet<VariableId>,
    used_parameters: FxHashSet<VariableId>,
}

impl ScopeStack {
    fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn declare(&mut self, name: &str, id: VariableId, kind: VariableKind) {
        self.frames
            .last_mut()
            .expect("a scope frame must be active")
            .insert(name.to_string(), id.clone());
        self.kinds.insert(id.clone(), kind);
        if kind == VariableKind::Parameter {
            self.parameters.insert(id);
        }
    }

    fn resolve(&self, name: &str) -> Option<VariableId> {
        self.frames.iter().rev().find_map(|frame| frame.get(name).cloned())
    }

    fn kind_of(&self, id: &VariableId) -> Option<VariableKind> {
        self.kinds.get(id).copied()
    }

    /// Returns whether `id` is a parameter that has not yet been used as a
    /// flow source, marking it used so every later reference sees `false`.
    fn take_first_parameter_use(&mut self, id: &VariableId) -> bool {
        if self.parameters.contains(id) && self.used_parameters.insert(id.clone()) {
            true
        } else {
            false
        }
    }
}

pub struct FunctionDataflow {
    pub variables: Vec<VariableRecord>,
    pub flows: Vec<DataFlowRecord>,
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Strips `pointer_declarator`/`array_declarator` wrappers to the identifier,
/// counting pointer depth along the way.
fn base_identifier<'a>(declarator: Node<'a>) -> Option<(Node<'a>, bool)> {
    let mut current = declarator;
    let mut is_pointer = false;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" => return Some((current, is_pointer)),
            "pointer_declarator" => {
                is_pointer = true;
                current = current.child_by_field_name("declarator")?;
            }
            "array_declarator" | "parenthesized_declarator" => {
                current = current.child_by_field_name("declarator")?;
            }
            "init_declarator" => {
                current = current.child_by_field_name("declarator")?;
            }
            _ => return None,
        }
    }
}

/// Walks a function's parameter list and body, emitting `VariableRecord`s and
/// `DataFlowRecord`s scoped entirely to `function_id`.
pub fn extract_function_dataflow(
    func_def: Node,
    source: &[u8],
    function_id: &FunctionId,
) -> FunctionDataflow {
    let mut scope = ScopeStack::default();
    scope.push();
    let mut out = FunctionDataflow {
        variables: Vec::new(),
        flows: Vec::new(),
    };

    if let Some(declarator) = func_def.child_by_field_name("declarator") {
        extract_parameters(declarator, source, function_id, &mut scope, &mut out);
    }

    if let Some(body) = func_def.child_by_field_name("body") {
        walk_statement(body, source, function_id, &mut scope, &mut out);
    }

    scope.pop();
    tracing::trace!(
        function = %function_id,
        variables = out.variables.len(),
        flows = out.flows.len(),
        "extracted data flow"
    );
    out
}

fn extract_parameters(
    declarator: Node,
    source: &[u8],
    function_id: &FunctionId,
    scope: &mut ScopeStack,
    out: &mut FunctionDataflow,
) {
    let Some(function_declarator) = find_function_declarator(declarator) else {
        return;
    };
    let Some(params) = function_declarator.child_by_field_name("parameters") else {
        return;
    };

    let mut cursor = params.walk();
    for param in params.children(&mut cursor) {
        if param.kind() != "parameter_declaration" {
            continue;
        }
        let Some(decl) = param.child_by_field_name("declarator") else {
            continue;
        };
        let Some((ident, is_pointer)) = base_identifier(decl) else {
            continue;
        };
        let name = node_text(ident, source).to_string();
        let line = line_of(param);
        let id = VariableId::new(function_id, &name, line);
        scope.declare(&name, id.clone(), VariableKind::Parameter);
        out.variables.push(VariableRecord {
            id,
            function_id: function_id.clone(),
            name,
            type_string: param.child_by_field_name("type").map(|t| node_text(t, source).to_string()),
            kind: VariableKind::Parameter,
            is_pointer,
            declaration_line: line,
            initial_value_expr: None,
        });
    }
}

fn find_function_declarator(declarator: Node) -> Option<Node> {
    let mut current = declarator;
    loop {
        match current.kind() {
            "function_declarator" => return Some(current),
            "pointer_declarator" | "parenthesized_declarator" => {
                current = current.child_by_field_name("declarator")?;
            }
            _ => return None,
        }
    }
}

fn walk_statement(
    node: Node,
    source: &[u8],
    function_id: &FunctionId,
    scope: &mut ScopeStack,
    out: &mut FunctionDataflow,
) {
    match node.kind() {
        "compound_statement" => {
            scope.push();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk_statement(child, source, function_id, scope, out);
            }
            scope.pop();
        }
        "declaration" => extract_declaration(node, source, function_id, scope, out),
        "expression_statement" => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "assignment_expression" {
                    extract_assignment(child, source, function_id, scope, out);
                }
            }
        }
        "return_statement" => extract_return(node, source, function_id, scope, out),
        _ => {
            // Compound control constructs (if/for/while/switch/labeled) are
            // walked structurally so declarations and assignments nested
            // inside them are still found; the construct itself carries no
            // flow semantics of its own (no CFG is modeled here).
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk_statement(child, source, function_id, scope, out);
            }
        }
    }
}

/// File-static globals are handled the same way as locals when referenced
/// inside a function; top-level `declaration`s outside any function
/// are not visited by this module at all (Module A owns file-scope walking).
fn extract_declaration(
    node: Node,
    source: &[u8],
    function_id: &FunctionId,
    scope: &mut ScopeStack,
    out: &mut FunctionDataflow,
) {
    let type_string = node
        .child_by_field_name("type")
        .map(|t| node_text(t, source).to_string());
    let is_static_decl = {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .any(|c| c.kind() == "storage_class_specifier" && node_text(c, source) == "static")
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let (declarator, initializer) = match child.kind() {
            "init_declarator" => (
                child.child_by_field_name("declarator"),
                child.child_by_field_name("value"),
            ),
            "identifier" | "pointer_declarator" | "array_declarator" => (Some(child), None),
            _ => continue,
        };
        let Some(declarator) = declarator else { continue };
        let Some((ident, is_pointer)) = base_identifier(declarator) else {
            continue;
        };
        let name = node_text(ident, source).to_string();
        let line = line_of(child);
        let id = VariableId::new(function_id, &name, line);
        let kind = if is_static_decl {
            VariableKind::Static
        } else {
            VariableKind::Local
        };
        scope.declare(&name, id.clone(), kind);

        out.variables.push(VariableRecord {
            id: id.clone(),
            function_id: function_id.clone(),
            name: name.clone(),
            type_string: type_string.clone(),
            kind,
            is_pointer,
            declaration_line: line,
            initial_value_expr: initializer.map(|v| node_text(v, source).to_string()),
        });

        if let Some(init) = initializer {
            emit_flows_from_expression(init, source, function_id, scope, &id, FlowKind::Initialization, out);
        }
    }
}

fn extract_assignment(
    node: Node,
    source: &[u8],
    function_id: &FunctionId,
    scope: &mut ScopeStack,
    out: &mut FunctionDataflow,
) {
    let Some(left) = node.child_by_field_name("left") else { return };
    let Some(right) = node.child_by_field_name("right") else { return };
    // Compound operators (`+=` etc.) are treated the same as `=` — the
    // target is still the flow sink, just with an implicit extra source
    // that this design does not separately model.
    let Some((ident, _)) = base_identifier(left) else { return };
    let name = node_text(ident, source).to_string();
    let Some(target_id) = scope.resolve(&name) else {
        // Target not declared in any visible scope (e.g. a global not
        // modeled as a VariableRecord) — no FLOWS_TO edge without both ends.
        return;
    };

    // A bare `local = param;` where this is the parameter's first reference
    // anywhere in the function gets its own flow kind so downstream risk
    // scoring can tell "param copied into a local right away" apart from an
    // ordinary reassignment.
    let target_is_local = scope.kind_of(&target_id) == Some(VariableKind::Local);
    let flow_kind = if right.kind() == "identifier" && target_is_local {
        match scope.resolve(node_text(right, source)) {
            Some(source_id) if scope.take_first_parameter_use(&source_id) => {
                FlowKind::ParameterBindingLocal
            }
            _ => FlowKind::Assignment,
        }
    } else {
        FlowKind::Assignment
    };

    emit_flows_from_expression(right, source, function_id, scope, &target_id, flow_kind, out);
}

fn extract_return(
    node: Node,
    source: &[u8],
    function_id: &FunctionId,
    scope: &mut ScopeStack,
    out: &mut FunctionDataflow,
) {
    let mut cursor = node.walk();
    let Some(expr) = node.children(&mut cursor).find(|c| !matches!(c.kind(), "return" | ";")) else {
        return;
    };
    let return_id = VariableId::new(function_id, RETURN_VALUE_VARIABLE, line_of(node));
    emit_flows_from_expression(expr, source, function_id, scope, &return_id, FlowKind::ReturnValue, out);
}

/// A direct identifier reference is confidence 1.0; anything else
/// referencing known variables is confidence 0.5 per referenced source,
/// truncated to `MAX_FLOW_SOURCES_PER_EXPRESSION`. Ternary branches both
/// contribute; dereference/address-of are transparent (no aliasing modeled).
fn emit_flows_from_expression(
    expr: Node,
    source: &[u8],
    function_id: &FunctionId,
    scope: &mut ScopeStack,
    target_id: &VariableId,
    flow_kind: FlowKind,
    out: &mut FunctionDataflow,
) {
    let source_expression = node_text(expr, source).to_string();

    if expr.kind() == "identifier" {
        if let Some(source_id) = scope.resolve(node_text(expr, source)) {
            scope.take_first_parameter_use(&source_id);
            out.flows.push(DataFlowRecord {
                function_id: function_id.clone(),
                source_id,
                target_id: target_id.clone(),
                flow_kind,
                line_number: line_of(expr),
                source_expression,
                confidence: 1.0,
            });
        }
        return;
    }

    let mut referenced = Vec::new();
    collect_referenced_variables(expr, source, scope, &mut referenced);
    referenced.truncate(MAX_FLOW_SOURCES_PER_EXPRESSION);

    for source_id in referenced {
        scope.take_first_parameter_use(&source_id);
        out.flows.push(DataFlowRecord {
            function_id: function_id.clone(),
            source_id,
            target_id: target_id.clone(),
            flow_kind,
            line_number: line_of(expr),
            source_expression: source_expression.clone(),
            confidence: 0.5,
        });
    }
}

fn collect_referenced_variables(
    node: Node,
    source: &[u8],
    scope: &ScopeStack,
    out: &mut Vec<VariableId>,
) {
    if node.kind() == "identifier" {
        if let Some(id) = scope.resolve(node_text(node, source)) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_referenced_variables(child, source, scope, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(src: &str) -> (tree_sitter::Tree, Vec<u8>) {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_c::LANGUAGE.into()).unwrap();
        let bytes = src.as_bytes().to_vec();
        let tree = parser.parse(&bytes, None).unwrap();
        (tree, bytes)
    }

    fn first_function(tree: &tree_sitter::Tree) -> Node {
        let root = tree.root_node();
        let mut cursor = root.walk();
        root.children(&mut cursor)
            .find(|c| c.kind() == "function_definition")
            .unwrap()
    }

    #[test]
    fn scenario_e_intra_procedural_flow() {
        let (tree, src) = parse("int f(int a) { int b = a; int c = b + 1; return c; }");
        let func = first_function(&tree);
        let function_id = FunctionId::new("f.c", "f", 1);
        let result = extract_function_dataflow(func, &src, &function_id);

        assert_eq!(result.flows.len(), 3);
        assert_eq!(result.flows[0].flow_kind as u8, FlowKind::Initialization as u8);
        assert!((result.flows[0].confidence - 1.0).abs() < f64::EPSILON);
        assert!((result.flows[1].confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.flows[2].flow_kind as u8, FlowKind::ReturnValue as u8);
        assert!((result.flows[2].confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_flow_crosses_function_scope() {
        let (tree, src) = parse("int f(int a) { int b = a; return b; }");
        let func = first_function(&tree);
        let function_id = FunctionId::new("f.c", "f", 1);
        let result = extract_function_dataflow(func, &src, &function_id);
        for flow in &result.flows {
            assert!(flow.source_id.as_str().starts_with(function_id.as_str()));
            assert!(flow.target_id.as_str().starts_with(function_id.as_str()));
        }
    }

    #[test]
    fn first_bare_assignment_of_a_parameter_to_a_local_is_a_binding() {
        let (tree, src) = parse("int f(int a) { int b; b = a; return b; }");
        let func = first_function(&tree);
        let function_id = FunctionId::new("f.c", "f", 1);
        let result = extract_function_dataflow(func, &src, &function_id);

        let binding = result
            .flows
            .iter()
            .find(|flow| flow.flow_kind == FlowKind::ParameterBindingLocal)
            .expect("first bare assignment of a parameter must bind to a local");
        assert_eq!(binding.source_expression, "a");
    }

    #[test]
    fn second_assignment_of_the_same_parameter_is_an_ordinary_assignment() {
        let (tree, src) = parse("int f(int a) { int b; int c; b = a; c = a; return b + c; }");
        let func = first_function(&tree);
        let function_id = FunctionId::new("f.c", "f", 1);
        let result = extract_function_dataflow(func, &src, &function_id);

        let bindings = result
            .flows
            .iter()
            .filter(|flow| flow.flow_kind == FlowKind::ParameterBindingLocal)
            .count();
        assert_eq!(bindings, 1, "only the first use of `a` should bind, the second is a plain assignment");
    }
}
