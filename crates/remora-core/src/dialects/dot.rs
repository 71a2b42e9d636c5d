//! Python graphviz-builder programs.
//!
//! The faithful path executes the builder (with a small harness appended so
//! the graph body gets printed) and feeds the emitted DOT source through
//! `dot -Tjson`, which yields exact node geometry alongside structure. When
//! neither interpreter nor layout tool is available the source is scanned
//! statically for `.node(...)` / `.edge(...)` call sites instead, which
//! recovers structure but no geometry.

use regex::Regex;
use std::sync::OnceLock;

use crate::ir::{BoundingBox, EdgeDraft, GraphDraft, Orientation};
use crate::render::{RenderError, Renderer};
use crate::style::Declarations;
use crate::utils::to_float;

/// Graphviz shape names mapped onto the canonical vocabulary. Unlisted
/// shapes pass through unchanged.
const SHAPE_MAPPING: [(&str, &str); 6] = [
    ("box", "rect"),
    ("doublecircle", "double-circle"),
    ("Mdiamond", "diamond"),
    ("Msquare", "rect"),
    ("plaintext", "text"),
    ("oval", "ellipse"),
];

const POINTS_PER_INCH: f64 = 72.0;

fn map_shape(shape: &str) -> String {
    SHAPE_MAPPING
        .iter()
        .find(|(from, _)| *from == shape)
        .map_or_else(|| shape.to_string(), |(_, to)| (*to).to_string())
}

fn rankdir_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"rankdir\s*=\s*['"]?(TB|BT|LR|RL)['"]?"#).expect("valid regex")
    })
}

fn builder_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^(?P<var>\w+)\s*=\s*graphviz\.(?:Digraph|Graph)\b").expect("valid regex")
    })
}

fn builder_fn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^def\s+(?P<name>(?:example|create|build)_\w+)\s*\(").expect("valid regex")
    })
}

/// Prepares a builder program for execution: drops `.view()` so no viewer
/// opens, then appends a harness that locates the graph and prints its DOT
/// source on stdout.
pub(crate) fn instrument_builder(code: &str) -> Option<String> {
    let mut program = code
        .lines()
        .filter(|line| !line.trim_start().starts_with(".view(") && !line.contains(".view()"))
        .collect::<Vec<_>>()
        .join("\n");

    let target = if let Some(caps) = builder_fn_regex().captures(code) {
        format!("_g = {}()", &caps["name"])
    } else if let Some(caps) = builder_var_regex().captures(code) {
        format!("_g = {}", &caps["var"])
    } else {
        return None;
    };

    program.push_str("\n\nif __name__ == \"__main__\":\n    ");
    program.push_str(&target);
    program.push_str("\n    print(_g.source)\n");
    Some(program)
}

fn orientation_from_source(dot_source: &str) -> Orientation {
    rankdir_regex()
        .captures(dot_source)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(Orientation::TopBottom)
}

fn style_declarations(object: &serde_json::Value) -> Declarations {
    let mut decls = Declarations::new();
    if let Some(color) = object.get("color").and_then(|v| v.as_str()) {
        decls.insert("stroke".to_string(), color.to_string());
    }
    if let Some(fill) = object.get("fillcolor").and_then(|v| v.as_str()) {
        decls.insert("fill".to_string(), fill.to_string());
    }
    if let Some(width) = object.get("penwidth").and_then(|v| v.as_str()) {
        decls.insert("penwidth".to_string(), width.to_string());
    }
    if let Some(style) = object.get("style").and_then(|v| v.as_str()) {
        for token in style.split(',').map(str::trim) {
            match token {
                "dashed" | "dotted" => {
                    decls.insert("stroke-dasharray".to_string(), "dashed".to_string());
                }
                "bold" => {
                    decls.insert("stroke-width".to_string(), "2".to_string());
                }
                "filled" => {}
                _ => {}
            }
        }
    }
    decls
}

fn parse_pos(pos: &str) -> Option<(f64, f64)> {
    let mut parts = pos.split(',');
    let x = to_float(parts.next()?)?;
    let y = to_float(parts.next()?)?;
    Some((x, y))
}

/// Builds a draft from a `dot -Tjson` layout document.
fn draft_from_layout(
    layout: &serde_json::Value,
    dot_source: &str,
    source_id: &str,
) -> GraphDraft {
    let mut draft = GraphDraft::new("graphviz", source_id);
    draft.orientation = orientation_from_source(dot_source);
    draft.directed = layout
        .get("directed")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if let Some(name) = layout.get("name").and_then(|v| v.as_str()) {
        if !name.is_empty() && name != "%3" {
            draft.title = name.to_string();
        }
    }

    let objects = layout
        .get("objects")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    // gvid -> node id, for resolving edge endpoints.
    let mut gvid_names: rustc_hash::FxHashMap<u64, String> = rustc_hash::FxHashMap::default();

    for object in &objects {
        let Some(name) = object.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        if let Some(gvid) = object.get("_gvid").and_then(|v| v.as_u64()) {
            gvid_names.insert(gvid, name.to_string());
        }

        let is_cluster = object.get("nodes").is_some() || name.starts_with("cluster");
        if is_cluster {
            let group = draft.ensure_group(name);
            if let Some(label) = object.get("label").and_then(|v| v.as_str()) {
                if label != "\\N" {
                    group.label = Some(label.to_string());
                }
            }
            if let Some(fill) = object.get("fillcolor").and_then(|v| v.as_str()) {
                group.fill = Some(fill.to_string());
            }
            if let Some(bb) = object.get("bb").and_then(|v| v.as_str()) {
                let coords: Vec<f64> = bb.split(',').filter_map(to_float).collect();
                if let [x0, y0, x1, y1] = coords[..] {
                    group.bounding_box = Some(BoundingBox {
                        x: x0,
                        y: y0,
                        width: x1 - x0,
                        height: y1 - y0,
                    });
                }
            }
            continue;
        }

        let node = draft.ensure_node(name);
        match object.get("label").and_then(|v| v.as_str()) {
            Some(label) if label != "\\N" => node.fill_label(label),
            _ => node.fill_label(name),
        }
        if let Some(shape) = object.get("shape").and_then(|v| v.as_str()) {
            node.fill_shape(&map_shape(shape));
        } else {
            node.fill_shape("ellipse");
        }
        if let Some(pos) = object.get("pos").and_then(|v| v.as_str()) {
            node.pos = parse_pos(pos);
        }
        if let Some(width) = object.get("width").and_then(|v| v.as_str()).and_then(to_float) {
            node.width = Some(width * POINTS_PER_INCH);
        }
        if let Some(height) = object.get("height").and_then(|v| v.as_str()).and_then(to_float) {
            node.height = Some(height * POINTS_PER_INCH);
        }
        node.inline = style_declarations(object);
    }

    // Cluster membership: layout objects carry a `nodes` list of gvids.
    for object in &objects {
        let Some(members) = object.get("nodes").and_then(|v| v.as_array()) else {
            continue;
        };
        let Some(name) = object.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        let member_ids: Vec<String> = members
            .iter()
            .filter_map(|m| m.as_u64())
            .filter_map(|gvid| gvid_names.get(&gvid).cloned())
            .collect();
        let group = draft.ensure_group(name);
        for id in member_ids {
            group.add_member(&id);
        }
    }

    let directed = draft.directed;
    if let Some(edges) = layout.get("edges").and_then(|v| v.as_array()) {
        for object in edges {
            let tail = object
                .get("tail")
                .and_then(|v| v.as_u64())
                .and_then(|gvid| gvid_names.get(&gvid));
            let head = object
                .get("head")
                .and_then(|v| v.as_u64())
                .and_then(|gvid| gvid_names.get(&gvid));
            let (Some(tail), Some(head)) = (tail, head) else {
                draft.warn("edge with unresolved endpoints in layout".to_string());
                continue;
            };
            let mut edge = EdgeDraft::new(tail, head, directed);
            if let Some(label) = object.get("label").and_then(|v| v.as_str()) {
                edge.label = Some(label.to_string());
            }
            edge.inline = style_declarations(object);
            draft.push_edge(edge);
        }
    }

    draft
}

/// Positional + keyword call-argument scanner for the static fallback.
/// Splits on top-level commas, honouring parentheses, brackets and both
/// quote styles.
fn split_call_args(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (i, ch) in args.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                ',' if depth == 0 => {
                    parts.push(&args[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&args[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Unquotes a Python string literal; `None` for non-literal expressions.
fn literal(arg: &str) -> Option<String> {
    let arg = arg.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = arg
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            if !inner.contains(quote) {
                return Some(inner.to_string());
            }
        }
    }
    None
}

/// Finds `recv.method(args)` call sites, returning the argument bodies.
/// Parentheses inside string literals do not terminate the scan.
fn call_sites<'a>(code: &'a str, method: &str) -> Vec<&'a str> {
    let needle = format!(".{method}(");
    let mut sites = Vec::new();
    let mut offset = 0usize;
    while let Some(found) = code[offset..].find(&needle) {
        let args_start = offset + found + needle.len();
        let mut depth = 1i32;
        let mut quote: Option<char> = None;
        let mut end = None;
        for (i, ch) in code[args_start..].char_indices() {
            match quote {
                Some(q) => {
                    if ch == q {
                        quote = None;
                    }
                }
                None => match ch {
                    '\'' | '"' => quote = Some(ch),
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(args_start + i);
                            break;
                        }
                    }
                    _ => {}
                },
            }
        }
        let Some(end) = end else { break };
        sites.push(&code[args_start..end]);
        offset = end + 1;
    }
    sites
}

fn keyword_declarations(args: &[&str], skip_positional: usize) -> (Declarations, Option<String>) {
    let mut decls = Declarations::new();
    let mut shape = None;
    for arg in args.iter().skip(skip_positional) {
        let Some((key, value)) = arg.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let Some(value) = literal(value) else {
            continue;
        };
        match key {
            "shape" => shape = Some(map_shape(&value)),
            "color" => {
                decls.insert("stroke".to_string(), value);
            }
            "fillcolor" => {
                decls.insert("fill".to_string(), value);
            }
            "penwidth" => {
                decls.insert("penwidth".to_string(), value);
            }
            "fontcolor" => {
                decls.insert("color".to_string(), value);
            }
            "style" => {
                if value.split(',').any(|t| t.trim() == "dashed" || t.trim() == "dotted") {
                    decls.insert("stroke-dasharray".to_string(), "dashed".to_string());
                }
                if value.split(',').any(|t| t.trim() == "bold") {
                    decls.insert("stroke-width".to_string(), "2".to_string());
                }
            }
            _ => {}
        }
    }
    (decls, shape)
}

/// Static fallback: recovers structure from builder call sites without
/// running anything. Geometry is unavailable on this path.
pub fn parse(code: &str, source_id: &str) -> GraphDraft {
    let mut draft = GraphDraft::new("graphviz", source_id);
    draft.orientation = orientation_from_source(code);
    draft.directed = !code.contains("graphviz.Graph(") || code.contains("graphviz.Digraph(");

    for args in call_sites(code, "node") {
        let args = split_call_args(args);
        let Some(first) = args.first() else { continue };
        let Some(id) = literal(first) else {
            draft.warn(format!("dynamic node argument skipped: {first}"));
            continue;
        };
        let label = args
            .get(1)
            .filter(|a| !a.contains('='))
            .and_then(|a| literal(a));
        let (decls, shape) = keyword_declarations(&args, 1);

        let node = draft.ensure_node(&id);
        node.fill_label(label.as_deref().unwrap_or(&id));
        node.fill_shape(shape.as_deref().unwrap_or("ellipse"));
        node.inline.extend(decls);
    }

    let directed = draft.directed;
    for args in call_sites(code, "edge") {
        let args = split_call_args(args);
        let (Some(from_arg), Some(to_arg)) = (args.first(), args.get(1)) else {
            continue;
        };
        let (Some(from), Some(to)) = (literal(from_arg), literal(to_arg)) else {
            draft.warn(format!("dynamic edge argument skipped: {from_arg}, {to_arg}"));
            continue;
        };
        draft.ensure_node(&from).fill_label(&from);
        draft.ensure_node(&to).fill_label(&to);

        let mut edge = EdgeDraft::new(&from, &to, directed);
        edge.label = args
            .get(2)
            .filter(|a| !a.contains('='))
            .and_then(|a| literal(a))
            .or_else(|| {
                args.iter()
                    .find_map(|a| a.strip_prefix("label=").and_then(literal))
            });
        let (decls, _) = keyword_declarations(&args, 2);
        edge.inline = decls;
        draft.push_edge(edge);
    }

    if draft.nodes.is_empty() && draft.edges.is_empty() {
        draft.warn("no builder calls found in source".to_string());
    }

    draft
}

/// Execution path: instrument, run through the interpreter, lay out with
/// `dot -Tjson`. Falls back to the static scan on any tool failure, with a
/// warning naming the step that was skipped.
pub fn parse_with_layout(code: &str, source_id: &str, renderer: &dyn Renderer) -> GraphDraft {
    let Some(program) = instrument_builder(code) else {
        let mut draft = parse(code, source_id);
        draft.warn("dot_layout_skipped:no_builder_found".to_string());
        return draft;
    };

    let dot_source = match renderer.run_builder(&program) {
        Ok(source) => source,
        Err(err) => {
            let mut draft = parse(code, source_id);
            draft.warn(layout_warning("builder", &err));
            return draft;
        }
    };

    match renderer.layout_graph(&dot_source) {
        Ok(layout) => draft_from_layout(&layout, &dot_source, source_id),
        Err(err) => {
            let mut draft = parse(code, source_id);
            draft.warn(layout_warning("layout", &err));
            draft
        }
    }
}

fn layout_warning(step: &str, err: &RenderError) -> String {
    match err {
        RenderError::ToolMissing(tool) => format!("dot_layout_skipped:{tool}_not_found"),
        RenderError::Timeout(tool) => format!("dot_layout_skipped:{tool}_timeout"),
        _ => format!("dot_layout_skipped:{step}_failed"),
    }
}
