//! Module C: identifies unit tests and maps them to the functions they
//! call, using the same `ignore::WalkBuilder` discovery
//! `sentinel-parser` uses for subsystem files, reusing
//! `sentinel_parser::extract_from_file` rather than re-parsing — a test
//! file is still just a C translation unit, the only thing that differs is
//! which functions inside it count as "tests".

use std::path::Path;

use ignore::WalkBuilder;
use regex::Regex;
use rustc_hash::FxHashMap;

use sentinel_core::constants::{TEST_DIR_MARKERS, TEST_FILE_SUFFIX};
use sentinel_core::errors::ResolveWarning;
use sentinel_core::types::identifiers::TestCaseId;
use sentinel_core::types::records::{CoverageKind, CoversRecord, FunctionRecord, TestCaseRecord};

fn test_function_name_pattern() -> Regex {
    Regex::new(r"(?i)(^test_)|(_test$)|(_test_case$)|(^ktest_)").unwrap()
}

fn assertion_callee_pattern() -> Regex {
    Regex::new(r"(?i)^(assert|expect|kunit_assert|ksft_test_result)").unwrap()
}

/// Is `path` conventionally a test file: under `tools/testing/` or
/// `kunit/`, or suffixed `_test.c`.
pub fn is_test_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    if path_str.ends_with(TEST_FILE_SUFFIX) {
        return true;
    }
    TEST_DIR_MARKERS.iter().any(|marker| path_str.contains(marker))
}

fn detect_framework(source: &str) -> Option<&'static str> {
    if source.contains("kunit_case") || source.contains("KUNIT_CASE") {
        Some("kunit")
    } else if source.contains("kselftest") || source.contains("ksft_") {
        Some("kselftest")
    } else if source.contains("selftest") {
        Some("selftest")
    } else {
        None
    }
}

pub fn discover_test_files(root: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = WalkBuilder::new(root)
        .hidden(true)
        .follow_links(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("c"))
        .filter(|path| is_test_file(path))
        .collect();
    files.sort();
    files
}

/// `map_tests(root) -> (Vec<TestCase>, Vec<Covers>)`. `known_functions`
/// is the subsystem's already-ingested function set — a `COVERS` edge is
/// only emitted when a test's callee uniquely names one of them; ambiguous
/// or absent callees are simply not covered (`CoversEdge` has no
/// placeholder-target concept, unlike `CALLS`).
pub fn map_tests(
    root: &Path,
    known_functions: &[FunctionRecord],
) -> (Vec<TestCaseRecord>, Vec<CoversRecord>, Vec<ResolveWarning>) {
    let name_pattern = test_function_name_pattern();
    let assertion_pattern = assertion_callee_pattern();
    let mut name_index: FxHashMap<&str, Vec<&FunctionRecord>> = FxHashMap::default();
    for function in known_functions {
        name_index.entry(function.name.as_str()).or_default().push(function);
    }

    let mut tests = Vec::new();
    let mut covers = Vec::new();
    let mut warnings = Vec::new();

    for path in discover_test_files(root) {
        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => continue,
        };
        let Some(framework) = detect_framework(&source) else {
            warnings.push(ResolveWarning::UnknownFramework {
                file: path.display().to_string(),
            });
            continue;
        };

        let subsystem = "test".to_string();
        let extraction = sentinel_parser::extract_from_file(&path, &subsystem);
        let file_path = path.display().to_string();

        for function in &extraction.functions {
            if !name_pattern.is_match(&function.name) {
                continue;
            }

            let assertions_count = extraction
                .calls
                .iter()
                .filter(|c| c.caller_id == function.id)
                .filter(|c| assertion_pattern.is_match(&c.callee_name))
                .count() as u32;

            let test_id = TestCaseId::new(&file_path, &function.name);
            tests.push(TestCaseRecord {
                id: test_id.clone(),
                name: function.name.clone(),
                file_path: file_path.clone(),
                framework: framework.to_string(),
                assertions_count,
            });

            let mut seen_callees = std::collections::HashSet::new();
            for call in extraction.calls.iter().filter(|c| c.caller_id == function.id) {
                if !seen_callees.insert(call.callee_name.clone()) {
                    continue;
                }
                if let Some([target]) = name_index.get(call.callee_name.as_str()).map(|v| v.as_slice()) {
                    covers.push(CoversRecord {
                        test_id: test_id.clone(),
                        function_id: target.id.clone(),
                        coverage_kind: CoverageKind::Direct,
                        confidence: 1.0,
                    });
                }
            }
        }
    }

    (tests, covers, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::types::identifiers::FunctionId;
    use std::io::Write;

    fn function(name: &str, subsystem: &str) -> FunctionRecord {
        FunctionRecord {
            id: FunctionId::new("target.c", name, 1),
            name: name.to_string(),
            file_path: "target.c".to_string(),
            line_start: 1,
            line_end: 3,
            is_static: false,
            is_inline: false,
            subsystem: subsystem.to_string(),
            return_type: None,
        }
    }

    #[test]
    fn kunit_test_function_covers_its_unique_callee() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("foo_test.c");
        let mut file = std::fs::File::create(&file_path).unwrap();
        writeln!(
            file,
            r#"
            #include "kunit_case.h"
            void foo_test(struct kunit *test) {{
                int result = target_fn(1);
                KUNIT_ASSERT_EQ(test, result, 2);
            }}
            "#
        )
        .unwrap();

        let target = function("target_fn", "net");
        let (tests, covers, warnings) = map_tests(dir.path(), &[target.clone()]);

        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].framework, "kunit");
        assert_eq!(covers.len(), 1);
        assert_eq!(covers[0].function_id, target.id);
        assert!(warnings.is_empty());
    }

    #[test]
    fn file_with_no_recognizable_framework_is_skipped_with_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("plain_test.c");
        std::fs::write(&file_path, "void not_a_marker(void) {}\n").unwrap();

        let (tests, covers, warnings) = map_tests(dir.path(), &[]);
        assert!(tests.is_empty());
        assert!(covers.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
