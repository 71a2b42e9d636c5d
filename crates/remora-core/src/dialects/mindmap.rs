//! Mindmap parser.
//!
//! Indentation drives the hierarchy: each statement's leading-space count,
//! halved, is its depth, and an ancestor stack is popped while the top is at
//! least as deep as the incoming statement. Every parent/child pair becomes
//! an undirected edge.

use regex::Regex;

use crate::ir::{EdgeDraft, GraphDraft, NodeDraft, Orientation};
use crate::utils::{clean_label, normalize_lines, slugify};

fn ident_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+").expect("valid regex"))
}

/// Shape markers around a mindmap statement body, checked in order.
const SHAPE_MARKERS: [(&str, &str, &str); 6] = [
    ("((", "))", "circle"),
    ("))", "((", "bang"),
    ("(-", "-)", "cloud"),
    ("{{", "}}", "hexagon"),
    ("[", "]", "rect"),
    ("(", ")", "round"),
];

struct Entry {
    depth: usize,
    id: String,
}

fn split_shape(body: &str) -> (&str, Option<&'static str>) {
    for (open, close, shape) in SHAPE_MARKERS {
        if let Some(inner) = body
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return (inner, Some(shape));
        }
    }
    (body, None)
}

fn unique_id(draft: &GraphDraft, base: &str) -> String {
    if !draft.contains_node(base) {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}_{n}");
        if !draft.contains_node(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

pub fn parse(code: &str, source_id: &str) -> GraphDraft {
    let mut draft = GraphDraft::new("mindmap", source_id);
    draft.orientation = Orientation::LeftRight;
    draft.directed = false;

    let mut stack: Vec<Entry> = Vec::new();
    let mut seen_header = false;

    for raw_line in normalize_lines(code) {
        if raw_line.trim().is_empty() || raw_line.trim_start().starts_with("%%") {
            continue;
        }
        let stripped = raw_line.trim_end();
        let body = stripped.trim_start();
        if !seen_header {
            if body == "mindmap" {
                seen_header = true;
                continue;
            }
            draft.warn(format!("unprocessed statement: {body}"));
            continue;
        }

        let indent = stripped.len() - body.len();
        let depth = indent / 2;

        // Icon decorations attach to the most recent node.
        if let Some(rest) = body.strip_prefix("::icon(") {
            let icon = rest.trim_end_matches(')').trim();
            if let Some(entry) = stack.last() {
                if let Some(node) = draft.node_mut(&entry.id) {
                    node.extras.insert("icon".to_string(), icon.to_string());
                }
            } else {
                draft.warn(format!("icon without a node: {icon}"));
            }
            continue;
        }

        while stack.last().is_some_and(|entry| entry.depth >= depth) {
            stack.pop();
        }

        // `id((label))` keeps the explicit id; a bare or marker-only body
        // derives its id from the label.
        let (explicit_id, inner, shape) = match ident_regex().find(body) {
            Some(ident) if !body[ident.end()..].is_empty() => {
                let rest = &body[ident.end()..];
                let (inner, shape) = split_shape(rest);
                if shape.is_some() {
                    (Some(ident.as_str().to_string()), inner, shape)
                } else {
                    let (inner, shape) = split_shape(body);
                    (None, inner, shape)
                }
            }
            _ => {
                let (inner, shape) = split_shape(body);
                (None, inner, shape)
            }
        };
        let label = clean_label(inner);
        let id = explicit_id.unwrap_or_else(|| slugify(&label));
        let id = unique_id(&draft, &id);

        let mut node = NodeDraft::new(&id);
        node.label = Some(label);
        node.shape = Some(shape.unwrap_or("rect").to_string());
        node.kind = Some("mindmap".to_string());
        draft.push_node(node);

        // Hierarchy edges point parent to child even though the graph as a
        // whole is undirected.
        if let Some(parent) = stack.last() {
            draft.push_edge(EdgeDraft::new(&parent.id, &id, true));
        }
        stack.push(Entry { depth, id });
    }

    draft
}
