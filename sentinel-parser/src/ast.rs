//! Module A: walks a C translation unit and yields [`FunctionRecord`]s and
//! [`CallRecord`]s. Parsing never fails outright — malformed input
//! yields partial records plus [`ParseWarning`]s.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use sentinel_core::config::PreprocessingConfig;
use sentinel_core::constants::DEFAULT_PREPROCESSOR_TOOL;
use sentinel_core::errors::ParseWarning;
use sentinel_core::types::identifiers::FunctionId;
use sentinel_core::types::records::{CallRecord, DataFlowRecord, FunctionRecord, VariableRecord};
use tree_sitter::{Node, Parser, Tree};

use crate::dataflow::extract_function_dataflow;
use crate::preprocessor::{preprocess_file, LineMap};

/// Everything extracted from one file, plus whatever went wrong along the way.
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub functions: Vec<FunctionRecord>,
    pub calls: Vec<CallRecord>,
    pub variables: Vec<VariableRecord>,
    pub flows: Vec<DataFlowRecord>,
    pub warnings: Vec<ParseWarning>,
}

/// The concatenation of every file's [`FileExtraction`] below a subsystem root.
#[derive(Debug, Clone, Default)]
pub struct SubsystemExtraction {
    pub functions: Vec<FunctionRecord>,
    pub calls: Vec<CallRecord>,
    pub variables: Vec<VariableRecord>,
    pub flows: Vec<DataFlowRecord>,
    pub warnings: Vec<ParseWarning>,
    pub files_parsed: usize,
    pub files_failed: usize,
}

fn new_parser() -> Parser {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .expect("tree-sitter-c grammar is ABI-compatible with this tree-sitter version");
    parser
}

/// Subsystem is the first path segment below `root`.
fn subsystem_of(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .ok()
        .and_then(|rel| rel.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Parses `path` with preprocessing disabled. Equivalent to
/// `extract_from_file_with_preprocessing(path, subsystem, &PreprocessingConfig::default())`.
pub fn extract_from_file(path: &Path, subsystem: &str) -> FileExtraction {
    extract_from_file_with_preprocessing(path, subsystem, &PreprocessingConfig::default())
}

/// Parses `path`, running it through the external preprocessor first when
/// `preprocessing.is_enabled()`. On a preprocessor failure this falls back to
/// the raw file and records a warning rather than failing the whole file.
pub fn extract_from_file_with_preprocessing(
    path: &Path,
    subsystem: &str,
    preprocessing: &PreprocessingConfig,
) -> FileExtraction {
    if !preprocessing.is_enabled() {
        return extract_from_raw_file(path, subsystem);
    }

    let include_paths: Vec<String> = preprocessing
        .include_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    match preprocess_file(DEFAULT_PREPROCESSOR_TOOL, path, &include_paths, &preprocessing.defines) {
        Ok(preprocessed) => parse_source(
            preprocessed.expanded_text.as_bytes(),
            path,
            subsystem,
            Some(&preprocessed.line_map),
        ),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "preprocessor failed, falling back to raw source");
            let mut extraction = extract_from_raw_file(path, subsystem);
            extraction.warnings.push(ParseWarning::MalformedConstruct {
                file: path.display().to_string(),
                line: 0,
                detail: format!("preprocessor unavailable, parsed raw source: {e}"),
            });
            extraction
        }
    }
}

fn extract_from_raw_file(path: &Path, subsystem: &str) -> FileExtraction {
    let source = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return FileExtraction {
                warnings: vec![ParseWarning::FileFailed {
                    file: path.display().to_string(),
                    detail: e.to_string(),
                }],
                ..Default::default()
            }
        }
    };
    parse_source(&source, path, subsystem, None)
}

fn parse_source(
    source: &[u8],
    path: &Path,
    subsystem: &str,
    line_map: Option<&LineMap>,
) -> FileExtraction {
    let mut parser = new_parser();
    let tree = match parser.parse(source, None) {
        Some(tree) => tree,
        None => {
            return FileExtraction {
                warnings: vec![ParseWarning::FileFailed {
                    file: path.display().to_string(),
                    detail: "tree-sitter returned no tree".to_string(),
                }],
                ..Default::default()
            }
        }
    };

    walk_translation_unit(&tree, source, path, subsystem, line_map)
}

fn walk_translation_unit(
    tree: &Tree,
    source: &[u8],
    path: &Path,
    subsystem: &str,
    line_map: Option<&LineMap>,
) -> FileExtraction {
    let mut out = FileExtraction::default();
    let root = tree.root_node();
    collect_function_definitions(root, source, path, subsystem, line_map, &mut out);
    tracing::debug!(
        file = %path.display(),
        functions = out.functions.len(),
        calls = out.calls.len(),
        "extracted file"
    );
    out
}

/// Descends through every node looking for `function_definition`s, not just
/// the translation unit's direct children. `#ifdef`/`#ifndef`/`#if`/`#elif`/
/// `#else` blocks wrap their contents in `preproc_ifdef`/`preproc_if`/etc.
/// nodes rather than splicing them into the parent's child list, so a
/// function guarded by a preprocessor conditional sits one or more levels
/// below the translation unit — pervasive in kernel-style code where the same
/// name is defined once per configuration. Stops descending once a
/// `function_definition` is found so a body's own statements are never
/// rescanned for nested definitions.
fn collect_function_definitions(
    node: Node,
    source: &[u8],
    path: &Path,
    subsystem: &str,
    line_map: Option<&LineMap>,
    out: &mut FileExtraction,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "function_definition" {
            extract_function_definition(&child, source, path, subsystem, line_map, out);
        } else {
            collect_function_definitions(child, source, path, subsystem, line_map, out);
        }
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Unwraps `pointer_declarator`/`parenthesized_declarator` wrappers down to the
/// innermost `function_declarator`, accumulating pointer depth as `*` prefixes
/// (used for best-effort `return_type` rendering only).
fn innermost_function_declarator<'a>(declarator: Node<'a>) -> Option<Node<'a>> {
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

fn declarator_name<'a>(declarator: Node<'a>, source: &'a [u8]) -> Option<&'a str> {
    let function_declarator = innermost_function_declarator(declarator)?;
    let name_node = function_declarator.child_by_field_name("declarator")?;
    Some(node_text(name_node, source))
}

fn has_specifier(func_def: Node, source: &[u8], keyword: &str) -> bool {
    let mut cursor = func_def.walk();
    func_def.children(&mut cursor).any(|child| {
        matches!(child.kind(), "storage_class_specifier" | "function_specifier")
            && node_text(child, source) == keyword
    })
}

/// Best-effort textual return type: every child preceding the declarator,
/// joined with a single space. Loses fidelity on unusual qualifier orders by
/// design — this is a best-effort rendering, not a type-accurate one.
fn best_effort_return_type(func_def: Node, source: &[u8]) -> Option<String> {
    let declarator = func_def.child_by_field_name("declarator")?;
    let mut parts = Vec::new();
    let mut cursor = func_def.walk();
    for child in func_def.children(&mut cursor) {
        if child.id() == declarator.id() {
            break;
        }
        if matches!(child.kind(), "{" | "}" | ";") {
            continue;
        }
        parts.push(node_text(child, source).trim().to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn extract_function_definition(
    func_def: &Node,
    source: &[u8],
    path: &Path,
    subsystem: &str,
    line_map: Option<&LineMap>,
    out: &mut FileExtraction,
) {
    let Some(declarator) = func_def.child_by_field_name("declarator") else {
        out.warnings.push(ParseWarning::UnrecognizedSubtree {
            file: path.display().to_string(),
            line: func_def.start_position().row as u32 + 1,
        });
        return;
    };

    let Some(name) = declarator_name(declarator, source) else {
        out.warnings.push(ParseWarning::MalformedConstruct {
            file: path.display().to_string(),
            line: func_def.start_position().row as u32 + 1,
            detail: "function definition has no resolvable declarator name".to_string(),
        });
        return;
    };

    let expanded_line_start = func_def.start_position().row as u32 + 1;
    let expanded_line_end = func_def.end_position().row as u32 + 1;
    let (file_path, line_start) = match line_map.and_then(|m| m.resolve(expanded_line_start)) {
        Some((original_file, original_line)) => (original_file.to_string(), original_line),
        None => (path.display().to_string(), expanded_line_start),
    };
    let line_end = match line_map.and_then(|m| m.resolve(expanded_line_end)) {
        Some((_, original_line)) => original_line,
        None => expanded_line_end,
    };
    let function_id = FunctionId::new(&file_path, name, line_start);

    out.functions.push(FunctionRecord {
        id: function_id.clone(),
        name: name.to_string(),
        file_path: file_path.clone(),
        line_start,
        line_end,
        is_static: has_specifier(*func_def, source, "static"),
        is_inline: has_specifier(*func_def, source, "inline"),
        subsystem: subsystem.to_string(),
        return_type: best_effort_return_type(*func_def, source),
    });

    if let Some(body) = func_def.child_by_field_name("body") {
        extract_calls_in_body(body, source, &function_id, out);
    }

    // Module D runs over the same subtree immediately: Variable records are
    // emitted before any DataFlow that references them, satisfying the
    // ingester's ordering requirement without a second parse pass.
    let flow = extract_function_dataflow(*func_def, source, &function_id);
    out.variables.extend(flow.variables);
    out.flows.extend(flow.flows);
}

/// Recursively visits every `call_expression` in a function body. Nested and
/// chained calls each emit their own record.
fn extract_calls_in_body(
    node: Node,
    source: &[u8],
    caller_id: &FunctionId,
    out: &mut FileExtraction,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "call_expression" {
            if let Some(call) = build_call_record(child, source, caller_id) {
                out.calls.push(call);
            }
        }
        extract_calls_in_body(child, source, caller_id, out);
    }
}

fn callee_text<'a>(call: Node<'a>, source: &'a [u8]) -> Option<&'a str> {
    let function_node = call.child_by_field_name("function")?;
    match function_node.kind() {
        "identifier" => Some(node_text(function_node, source)),
        // `obj.method(...)` / `obj->method(...)`: textual callee is the field name;
        // the base object is not modeled (no cross-function resolution exists for it).
        "field_expression" => {
            let field = function_node.child_by_field_name("field")?;
            Some(node_text(field, source))
        }
        "parenthesized_expression" => {
            let mut inner_cursor = function_node.walk();
            function_node
                .children(&mut inner_cursor)
                .find(|c| c.kind() == "identifier")
                .map(|c| node_text(c, source))
        }
        _ => None,
    }
}

fn build_call_record(call: Node, source: &[u8], caller_id: &FunctionId) -> Option<CallRecord> {
    let callee_name = callee_text(call, source)?.to_string();
    let line_number = call.start_position().row as u32 + 1;
    // Resolution against the subsystem's function index happens at ingest
    // time; until then every call targets its own placeholder.
    let callee_id = FunctionId::placeholder(&callee_name);
    Some(CallRecord {
        caller_id: caller_id.clone(),
        callee_id,
        callee_name,
        line_number,
        is_resolved: false,
    })
}

/// Iterates every `.c` file below `root` (symlinks not followed, hidden
/// directories skipped) and parses each in isolation across a rayon worker
/// pool, with preprocessing disabled.
pub fn extract_from_subsystem(root: &Path) -> SubsystemExtraction {
    extract_from_subsystem_with_preprocessing(root, &PreprocessingConfig::default())
}

/// Same as [`extract_from_subsystem`], running every file through the
/// external preprocessor first when `preprocessing.is_enabled()`.
pub fn extract_from_subsystem_with_preprocessing(
    root: &Path,
    preprocessing: &PreprocessingConfig,
) -> SubsystemExtraction {
    let files = discover_c_files(root);

    let per_file: Vec<FileExtraction> = files
        .par_iter()
        .map(|file| {
            let subsystem = subsystem_of(root, file);
            extract_from_file_with_preprocessing(file, &subsystem, preprocessing)
        })
        .collect();

    let mut out = SubsystemExtraction::default();
    for extraction in per_file {
        let failed = extraction.functions.is_empty()
            && extraction
                .warnings
                .iter()
                .any(|w| matches!(w, ParseWarning::FileFailed { .. }));
        if failed {
            out.files_failed += 1;
        } else {
            out.files_parsed += 1;
        }
        out.functions.extend(extraction.functions);
        out.calls.extend(extraction.calls);
        out.variables.extend(extraction.variables);
        out.flows.extend(extraction.flows);
        out.warnings.extend(extraction.warnings);
    }
    out
}

fn discover_c_files(root: &Path) -> Vec<PathBuf> {
    WalkBuilder::new(root)
        .hidden(true)
        .follow_links(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("c"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn leaf_helper_scenario_extracts_two_functions_and_one_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "helper.c",
            "static int helper(int x) { return x+1; }\nint caller(int y) { return helper(y); }\n",
        );
        let extraction = extract_from_file(&path, "demo");
        assert_eq!(extraction.functions.len(), 2);
        assert_eq!(extraction.calls.len(), 1);
        assert_eq!(extraction.calls[0].callee_name, "helper");

        let helper = extraction
            .functions
            .iter()
            .find(|f| f.name == "helper")
            .unwrap();
        assert!(helper.is_static);
        assert_eq!(helper.line_start, 1);
    }

    #[test]
    fn unresolved_callee_gets_a_placeholder_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "caller.c", "void caller(void) { extern_lib_fn(); }\n");
        let extraction = extract_from_file(&path, "demo");
        assert_eq!(extraction.calls.len(), 1);
        assert!(extraction.calls[0].callee_id.is_placeholder());
        assert!(!extraction.calls[0].is_resolved);
    }

    #[test]
    fn missing_file_produces_a_file_failed_warning() {
        let extraction = extract_from_file(Path::new("/nonexistent/path.c"), "demo");
        assert!(extraction.functions.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn duplicate_definitions_under_ifdef_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "variant.c",
            "#ifdef USE_FAST_PATH\nint configure(void) { return 1; }\n#else\nint configure(void) { return 2; }\n#endif\n",
        );
        let extraction = extract_from_file(&path, "demo");
        assert_eq!(extraction.functions.len(), 2);
        assert_ne!(extraction.functions[0].id, extraction.functions[1].id);
    }

    #[test]
    fn function_nested_two_levels_of_ifdef_is_still_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "nested.c",
            "#ifdef OUTER\n#ifdef INNER\nint deep(void) { return 1; }\n#endif\n#endif\n",
        );
        let extraction = extract_from_file(&path, "demo");
        assert_eq!(extraction.functions.len(), 1);
        assert_eq!(extraction.functions[0].name, "deep");
    }
}
