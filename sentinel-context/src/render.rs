//! `render(impact, slice) -> String`: a pure, deterministic Markdown
//! rendering of a [`FunctionImpact`] and an optional [`GraphSlice`], with a
//! fixed section order, per-list truncation-with-count-note, and
//! markdown-escaping of untrusted identifiers pulled from source.
//!
//! The template is versioned so that a future change to this format
//! doesn't silently change the bytes an already-deployed LLM reporter
//! parses: every render is prefixed with [`TEMPLATE_VERSION`].

use sentinel_analysis::{FunctionImpact, GraphSlice, ImpactNode};

use crate::tokenizer::TokenCounter;

/// Bumped whenever the section layout or field order below changes.
pub const TEMPLATE_VERSION: &str = "sentinel-context/v1";

/// Cap long lists so a function with thousands of callers doesn't blow the
/// report out; the count past the cap is still reported, just not enumerated.
const MAX_LIST_ENTRIES: usize = 50;

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|")
        .replace('#', "\\#")
        .replace('\n', " ")
        .replace('\r', "")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn render_node_list(title: &str, nodes: &[ImpactNode]) -> String {
    let mut out = format!("## {title}\n\n");
    if nodes.is_empty() {
        out.push_str("(none)\n\n");
        return out;
    }
    out.push_str("| Function | Distance | Placeholder |\n");
    out.push_str("|---|---|---|\n");
    for node in nodes.iter().take(MAX_LIST_ENTRIES) {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_markdown(&node.name),
            node.distance,
            node.is_placeholder
        ));
    }
    if nodes.len() > MAX_LIST_ENTRIES {
        out.push_str(&format!(
            "\n*Showing {} of {} entries*\n",
            MAX_LIST_ENTRIES,
            nodes.len()
        ));
    }
    out.push('\n');
    out
}

fn render_overview(impact: &FunctionImpact) -> String {
    let f = &impact.function;
    let mut out = String::from("## Overview\n\n");
    out.push_str(&format!("Function: `{}`\n\n", escape_markdown(&f.name)));
    out.push_str(&format!(
        "- Location: {}:{}-{}\n",
        escape_markdown(&f.file_path),
        f.line_start,
        f.line_end
    ));
    out.push_str(&format!("- Subsystem: {}\n", escape_markdown(&f.subsystem)));
    out.push_str(&format!("- Static: {}, Inline: {}\n", f.is_static, f.is_inline));
    out.push_str(&format!("- Risk level: **{}**\n", impact.risk_level.as_str()));
    if impact.truncated {
        out.push_str("- ⚠️ Caller/callee chains extend beyond the requested depth; counts above are exact only up to that depth.\n");
    }
    out.push('\n');
    out
}

fn render_test_coverage(impact: &FunctionImpact) -> String {
    let mut out = String::from("## Test Coverage\n\n");
    if impact.covering_tests_direct.is_empty() && impact.covering_tests_indirect.is_empty() {
        out.push_str("No covering tests found.\n\n");
        return out;
    }
    if !impact.covering_tests_direct.is_empty() {
        out.push_str("Direct:\n");
        for t in &impact.covering_tests_direct {
            out.push_str(&format!(
                "- `{}` ({}, {} assertions)\n",
                escape_markdown(&t.name),
                escape_markdown(&t.framework),
                t.assertions_count
            ));
        }
        out.push('\n');
    }
    if !impact.covering_tests_indirect.is_empty() {
        out.push_str("Indirect (via a caller):\n");
        for t in &impact.covering_tests_indirect {
            out.push_str(&format!(
                "- `{}` ({}, {} assertions)\n",
                escape_markdown(&t.name),
                escape_markdown(&t.framework),
                t.assertions_count
            ));
        }
        out.push('\n');
    }
    out
}

fn render_graph_slice(slice: &GraphSlice) -> String {
    let mut out = String::from("## Graph Slice\n\n");
    out.push_str(&format!(
        "{} nodes, {} edges.\n\n",
        slice.nodes.len(),
        slice.edges.len()
    ));
    for edge in slice.edges.iter().take(MAX_LIST_ENTRIES) {
        out.push_str(&format!(
            "- `{}` -> `{}` (line {})\n",
            escape_markdown(edge.caller.as_str()),
            escape_markdown(edge.callee.as_str()),
            edge.line_number
        ));
    }
    if slice.edges.len() > MAX_LIST_ENTRIES {
        out.push_str(&format!(
            "\n*Showing {} of {} edges*\n",
            MAX_LIST_ENTRIES,
            slice.edges.len()
        ));
    }
    out.push('\n');
    out
}

/// Renders `impact` (and, if present, `slice`) into one Markdown string.
/// Pure: no I/O, no clock, no randomness — the token-count footer falls
/// back to a length-based approximation rather than erroring if the
/// exact tokenizer can't be loaded, so this function itself never fails.
pub fn render(impact: &FunctionImpact, slice: Option<&GraphSlice>) -> String {
    let mut sections = vec![
        format!("<!-- {TEMPLATE_VERSION} -->"),
        render_overview(impact),
        render_node_list("Direct Callers", &impact.direct_callers),
        render_node_list("Indirect Callers", &impact.indirect_callers),
        render_node_list("Direct Callees", &impact.direct_callees),
        render_node_list("Indirect Callees", &impact.indirect_callees),
        render_node_list("Syscall Entry Points", &impact.syscall_entry_points),
        render_test_coverage(impact),
    ];
    if let Some(slice) = slice {
        sections.push(render_graph_slice(slice));
    }

    let body = sections.join("\n");
    let counter = TokenCounter::default();
    let token_count = counter
        .count(&body)
        .unwrap_or_else(|_| TokenCounter::count_approximate(&body));

    format!("{body}\n---\n*{token_count} tokens*\n")
}
