//! TikZ picture parser.
//!
//! Splits the document into preamble and `tikzpicture` body, collects style
//! definitions from `\tikzstyle` and `\tikzset`, then walks `\node`, `\draw`
//! and `\path` statements. TikZ option lists are rewritten into the shared
//! declaration vocabulary (`draw=` becomes `stroke`, `fill=` stays `fill`,
//! `dashed` becomes a dash request) so the style cascade treats every
//! dialect alike.

use regex::Regex;
use std::sync::OnceLock;

use crate::ir::{EdgeDraft, GraphDraft, Orientation};
use crate::style::Declarations;
use crate::utils::{clean_label, slugify, to_float};

fn tikzpicture_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\\begin\{tikzpicture\}(?:\[(?P<opts>[^\]]*)\])?(?P<body>.*?)\\end\{tikzpicture\}")
            .expect("valid regex")
    })
}

fn tikzstyle_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\tikzstyle\{(?P<name>[^}]+)\}\s*=\s*\[(?P<opts>[^\]]*)\]")
            .expect("valid regex")
    })
}

fn tikzset_style_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<name>[A-Za-z0-9 _-]+?)\s*/\.style\s*=\s*\{(?P<opts>[^{}]*)\}")
            .expect("valid regex")
    })
}

fn node_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\\node\s*(?:\[(?P<opts>[^\]]*)\])?\s*\((?P<id>[^)]+)\)\s*(?:at\s*\((?P<x>[-\d.]+)\s*,\s*(?P<y>[-\d.]+)\))?\s*\{(?P<label>[^{}]*)\}",
        )
        .expect("valid regex")
    })
}

fn edge_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\((?P<from>[^)]+)\)\s*edge\s*(?:\[(?P<opts>[^\]]*)\])?\s*(?:node\s*(?:\[[^\]]*\])?\s*\{(?P<label>[^{}]*)\}\s*)?\((?P<to>[^)]+)\)",
        )
        .expect("valid regex")
    })
}

fn coordinate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((?P<name>[A-Za-z0-9_. ]+)\)").expect("valid regex"))
}

fn segment_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"node\s*(?:\[[^\]]*\])?\s*\{(?P<label>[^{}]*)\}").expect("valid regex")
    })
}

/// TikZ option keywords that name a node shape.
const SHAPE_KEYWORDS: [(&str, &str); 8] = [
    ("circle", "circle"),
    ("ellipse", "ellipse"),
    ("rectangle", "rect"),
    ("diamond", "diamond"),
    ("rounded corners", "round"),
    ("cylinder", "cylinder"),
    ("trapezium", "trapezoid"),
    ("star", "star"),
];

/// Rewrites one TikZ option into the shared declaration vocabulary.
/// Returns `None` for options that are positional/layout noise.
fn map_option(key: &str, value: Option<&str>) -> Option<(String, String)> {
    let key = key.trim();
    match (key, value) {
        ("draw", None) => Some(("stroke".to_string(), "#000000".to_string())),
        ("draw", Some(v)) => Some(("stroke".to_string(), v.trim().to_string())),
        ("fill", Some(v)) => Some(("fill".to_string(), v.trim().to_string())),
        ("dashed", None) | ("densely dashed", None) | ("loosely dashed", None) => {
            Some(("stroke-dasharray".to_string(), "dashed".to_string()))
        }
        ("dotted", None) => Some(("stroke-dasharray".to_string(), "dashed".to_string())),
        ("thick", None) | ("very thick", None) | ("ultra thick", None) => {
            Some(("stroke-width".to_string(), "2".to_string()))
        }
        ("line width", Some(v)) => Some((
            "stroke-width".to_string(),
            v.trim().trim_end_matches("pt").trim().to_string(),
        )),
        ("text", Some(v)) => Some(("color".to_string(), v.trim().to_string())),
        ("color", Some(v)) => Some(("stroke".to_string(), v.trim().to_string())),
        _ => None,
    }
}

/// Splits a TikZ option list on top-level commas (braces nest).
fn split_options(options: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in options.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&options[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&options[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

struct ParsedOptions {
    declarations: Declarations,
    shape: Option<&'static str>,
    style_refs: Vec<String>,
}

fn parse_options(options: &str) -> ParsedOptions {
    let mut declarations = Declarations::new();
    let mut shape = None;
    let mut style_refs = Vec::new();

    for part in split_options(options) {
        if shape.is_none() {
            if let Some((_, mapped)) = SHAPE_KEYWORDS.iter().find(|(kw, _)| *kw == part) {
                shape = Some(*mapped);
                continue;
            }
        }
        let (key, value) = match part.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (part, None),
        };
        if let Some((k, v)) = map_option(key, value) {
            declarations.insert(k, v);
        } else if value.is_none() {
            // Bare word with no mapping: a style-definition reference.
            style_refs.push(key.to_string());
        }
    }

    ParsedOptions {
        declarations,
        shape,
        style_refs,
    }
}

fn statement_iter(body: &str) -> impl Iterator<Item = &str> {
    body.split(';').map(str::trim).filter(|s| !s.is_empty())
}

struct StyleTable {
    styles: indexmap::IndexMap<String, Declarations>,
}

impl StyleTable {
    fn collect(source: &str) -> Self {
        let mut styles = indexmap::IndexMap::new();
        for caps in tikzstyle_regex().captures_iter(source) {
            let parsed = parse_options(&caps["opts"]);
            styles.insert(caps["name"].trim().to_string(), parsed.declarations);
        }
        for caps in tikzset_style_regex().captures_iter(source) {
            let parsed = parse_options(&caps["opts"]);
            styles.insert(caps["name"].trim().to_string(), parsed.declarations);
        }
        StyleTable { styles }
    }

    /// Layers referenced style definitions under the inline declarations.
    fn apply(&self, refs: &[String], inline: Declarations) -> Declarations {
        let mut merged = Declarations::new();
        for name in refs {
            if let Some(decls) = self.styles.get(name) {
                for (k, v) in decls {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        for (k, v) in inline {
            merged.insert(k, v);
        }
        merged
    }
}

fn register_node(draft: &mut GraphDraft, styles: &StyleTable, caps: &regex::Captures<'_>) {
    let id = caps["id"].trim().to_string();
    let label = clean_label(&caps["label"]);
    let parsed = parse_options(caps.name("opts").map_or("", |m| m.as_str()));

    let node = draft.ensure_node(&id);
    if !label.is_empty() {
        node.fill_label(&label);
    }
    if let Some(shape) = parsed.shape {
        node.fill_shape(shape);
    }
    if let (Some(x), Some(y)) = (caps.name("x"), caps.name("y")) {
        if let (Some(x), Some(y)) = (to_float(x.as_str()), to_float(y.as_str())) {
            node.pos = Some((x, y));
        }
    }
    let merged = styles.apply(&parsed.style_refs, parsed.declarations);
    for (k, v) in merged {
        node.inline.insert(k, v);
    }
}

fn coordinate_node_id(draft: &mut GraphDraft, token: &str) -> String {
    let token = token.trim();
    // Anchor suffixes such as `a.north` address the bare node.
    let base = token.split('.').next().unwrap_or(token).trim();
    if base.is_empty() {
        return slugify(token);
    }
    let id = base.to_string();
    let node = draft.ensure_node(&id);
    node.fill_label(base);
    id
}

fn register_edges(
    draft: &mut GraphDraft,
    styles: &StyleTable,
    statement: &str,
    statement_opts: &str,
    default_directed: bool,
) {
    let base = parse_options(statement_opts);
    let directed = statement_opts.contains("->")
        || statement_opts.contains("<-")
        || default_directed;

    let mut matched = false;
    for caps in edge_keyword_regex().captures_iter(statement) {
        matched = true;
        let from = coordinate_node_id(draft, &caps["from"]);
        let to = coordinate_node_id(draft, &caps["to"]);
        let own = parse_options(caps.name("opts").map_or("", |m| m.as_str()));
        let edge_directed = directed
            || caps
                .name("opts")
                .is_some_and(|m| m.as_str().contains("->"));
        let mut edge = EdgeDraft::new(&from, &to, edge_directed);
        if let Some(label) = caps.name("label") {
            let label = clean_label(label.as_str());
            if !label.is_empty() {
                edge.label = Some(label);
            }
        }
        let mut refs = base.style_refs.clone();
        refs.extend(own.style_refs);
        let mut inline = base.declarations.clone();
        inline.extend(own.declarations);
        edge.inline = styles.apply(&refs, inline);
        draft.push_edge(edge);
    }
    if matched {
        return;
    }

    // Coordinate-chain form: `(a) -- (b) -- (c)` yields one edge per
    // consecutive pair; an interleaved `node{label}` labels its segment.
    let mut prev: Option<(usize, String)> = None;
    for caps in coordinate_regex().captures_iter(statement) {
        let whole = caps.get(0).expect("whole match");
        let name = caps["name"].to_string();
        if let Some((prev_end, prev_name)) = prev.take() {
            let between = &statement[prev_end..whole.start()];
            let connector = ["--", "->", "<-", " to "]
                .into_iter()
                .find(|c| between.contains(c));
            if let Some(connector) = connector {
                matched = true;
                let from = coordinate_node_id(draft, &prev_name);
                let to = coordinate_node_id(draft, &name);
                let edge_directed = directed || connector == "->" || connector == "<-";
                let (from, to) = if connector == "<-" { (to, from) } else { (from, to) };
                let mut edge = EdgeDraft::new(&from, &to, edge_directed);
                if let Some(label) = segment_label_regex()
                    .captures(between)
                    .map(|c| clean_label(&c["label"]))
                    .filter(|l| !l.is_empty())
                {
                    edge.label = Some(label);
                }
                edge.inline = styles.apply(&base.style_refs, base.declarations.clone());
                draft.push_edge(edge);
            }
        }
        prev = Some((whole.end(), name));
    }

    if !matched {
        draft.warn(format!("unprocessed statement: {}", statement.trim()));
    }
}

pub fn parse(code: &str, source_id: &str) -> GraphDraft {
    let mut draft = GraphDraft::new("tikz", source_id);
    draft.orientation = Orientation::TopBottom;

    let Some(picture) = tikzpicture_regex().captures(code) else {
        draft.warn("no tikzpicture environment found".to_string());
        return draft;
    };

    // Style definitions may live in the preamble or inside the picture.
    let styles = StyleTable::collect(code);

    let body = &picture["body"];
    // Pictures that use directed arrows anywhere treat bare connectors as
    // directed too.
    let default_directed = body.contains("->") || body.contains("<-");
    draft.directed = default_directed;
    for statement in statement_iter(body) {
        let statement = statement.trim_start_matches(['\n', '\r', ' ', '\t']);
        if statement.starts_with('%') {
            continue;
        }
        if statement.starts_with("\\node") {
            match node_regex().captures(statement) {
                Some(caps) => register_node(&mut draft, &styles, &caps),
                None => draft.warn(format!("unprocessed statement: {statement}")),
            }
        } else if statement.starts_with("\\draw") || statement.starts_with("\\path") {
            // Statement-level options sit before the first coordinate.
            let head_end = statement.find('(').unwrap_or(statement.len());
            let opts = statement[..head_end]
                .split_once('[')
                .and_then(|(_, rest)| rest.split_once(']'))
                .map_or("", |(opts, _)| opts);
            register_edges(&mut draft, &styles, statement, opts, default_directed);
        } else if statement.starts_with("\\tikzstyle") || statement.starts_with("\\tikzset") {
            // Already harvested by the style table pass.
        } else {
            draft.warn(format!("unprocessed statement: {statement}"));
        }
    }

    draft
}
