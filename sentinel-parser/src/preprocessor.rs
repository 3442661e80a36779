//! Optional preprocessor wrapper. Invokes an external C preprocessor
//! (`cc -E`, configurable) and keeps a map back to original `(file, line)`
//! coordinates via the `#line` directives the preprocessor emits.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use sentinel_core::errors::PreprocessorError;

/// Maps a 1-based line in the expanded output to the original source
/// location it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMap {
    /// expanded_line -> (original_file, original_line)
    entries: HashMap<u32, (String, u32)>,
}

impl LineMap {
    pub fn resolve(&self, expanded_line: u32) -> Option<(&str, u32)> {
        self.entries
            .get(&expanded_line)
            .map(|(file, line)| (file.as_str(), *line))
    }

    fn insert(&mut self, expanded_line: u32, original_file: String, original_line: u32) {
        self.entries.insert(expanded_line, (original_file, original_line));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedSource {
    pub expanded_text: String,
    pub line_map: LineMap,
}

/// Run `tool -E` (default `cc`) over `path` with the given include paths and
/// macro definitions, and build a [`LineMap`] from the `#line` directives the
/// preprocessor writes into its output.
///
/// Deliberately omits `-P`: that flag suppresses the linemarker directives
/// this function depends on to build the map back to original source
/// coordinates, which would otherwise degenerate to sequential numbering of
/// the expanded output.
///
/// This never aborts a pipeline run by itself: callers are expected to fall
/// back to the raw file and log a warning on `Err`.
pub fn preprocess_file(
    tool: &str,
    path: &Path,
    include_paths: &[String],
    defines: &[String],
) -> Result<PreprocessedSource, PreprocessorError> {
    let mut command = Command::new(tool);
    command.arg("-E").arg(path);
    for include in include_paths {
        command.arg(format!("-I{include}"));
    }
    for define in defines {
        command.arg(format!("-D{define}"));
    }

    let output = command.output().map_err(|_| PreprocessorError::ToolMissing {
        tool: tool.to_string(),
    })?;

    if !output.status.success() {
        return Err(PreprocessorError::NonZeroExit {
            file: path.display().to_string(),
            status: output.status.code().unwrap_or(-1),
        });
    }

    let expanded_text = String::from_utf8(output.stdout).map_err(|e| PreprocessorError::LineMapFailed {
        file: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let line_map = build_line_map(&expanded_text, path);
    Ok(PreprocessedSource { expanded_text, line_map })
}

/// Parses GNU-style `# <line> "<file>"` directives (also accepts the plain
/// `#line <line> "<file>"` form) to build the expanded-line -> original
/// mapping without retaining the directive lines themselves.
fn build_line_map(expanded_text: &str, fallback_file: &Path) -> LineMap {
    let mut map = LineMap::default();
    let mut current_file = fallback_file.display().to_string();
    let mut next_original_line: u32 = 1;
    let mut expanded_line: u32 = 0;

    for raw_line in expanded_text.lines() {
        expanded_line += 1;
        if let Some(directive) = parse_line_directive(raw_line) {
            current_file = directive.0;
            next_original_line = directive.1;
            continue;
        }
        map.insert(expanded_line, current_file.clone(), next_original_line);
        next_original_line += 1;
    }
    map
}

fn parse_line_directive(line: &str) -> Option<(String, u32)> {
    let rest = line.strip_prefix("# ").or_else(|| line.strip_prefix("#line "))?;
    let mut parts = rest.splitn(2, ' ');
    let line_no: u32 = parts.next()?.trim().parse().ok()?;
    let file = parts
        .next()?
        .trim()
        .trim_matches('"')
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string();
    if file.is_empty() {
        return None;
    }
    Some((file, line_no))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_directive_without_flags_parses() {
        assert_eq!(
            parse_line_directive(r#"# 12 "foo.c""#),
            Some(("foo.c".to_string(), 12))
        );
    }

    #[test]
    fn line_directive_with_gcc_flags_parses() {
        assert_eq!(
            parse_line_directive(r#"# 1 "foo.c" 1"#),
            Some(("foo.c".to_string(), 1))
        );
    }

    #[test]
    fn non_directive_line_is_rejected() {
        assert_eq!(parse_line_directive("int main(void) {}"), None);
    }

    #[test]
    fn map_tracks_line_advance_between_directives() {
        let text = "# 10 \"foo.c\"\nint a;\nint b;\n";
        let map = build_line_map(text, Path::new("foo.c"));
        assert_eq!(map.resolve(2), Some(("foo.c", 10)));
        assert_eq!(map.resolve(3), Some(("foo.c", 11)));
    }
}
