//! Flow-graph (flowchart/graph) structural parser.
//!
//! Line-oriented statement stream with a subgraph nesting stack. Statement
//! shapes are tried in priority order: `classDef`, `linkStyle`, `style`,
//! `class`, `subgraph`/`end`, edge statements, bare node declarations.
//! Anything unmatched is accumulated as a warning; malformed content never
//! raises.

use regex::Regex;

use crate::ir::{EdgeDraft, GraphDraft, Orientation};
use crate::style::parse_declarations;
use crate::utils::{clean_label, normalize_lines, slugify};

pub const DEFAULT_ORIENTATION: Orientation = Orientation::LeftRight;

/// Arrow tokens in match order. Longer / more specific tokens come first so a
/// substring token (`--` inside `-->`) can never shadow the real match.
const ARROW_TOKENS: [&str; 8] = ["-->", "-.->", "--x", "==>", "~~>", "->", "---", "--"];

fn node_ident_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeToken {
    pub id: String,
    pub label: String,
    pub shape: &'static str,
    pub class: Option<String>,
}

/// Splits a node token into identifier, label, shape and `:::class` suffix.
///
/// Shape-delimiting bracket pairs, most specific first: `[[..]]` subroutine,
/// `[..]` rect, `((..))` circle, `(..)` round, `{..}` diamond, `>..<`
/// subroutine.
pub(crate) fn split_node_token(token: &str) -> Option<NodeToken> {
    let mut token = token.trim();
    let mut class = None;
    if let Some((head, suffix)) = token.split_once(":::") {
        token = head.trim_end();
        let suffix = suffix.trim();
        if !suffix.is_empty() {
            class = Some(suffix.to_string());
        }
    }

    let Some(ident) = node_ident_regex().find(token) else {
        let id = token.trim().to_string();
        if id.is_empty() {
            return None;
        }
        return Some(NodeToken {
            label: clean_label(&id),
            id,
            shape: "rect",
            class,
        });
    };

    let id = ident.as_str().to_string();
    let remainder = token[ident.end()..].trim();

    let delimited = |open: &str, close: &str| -> Option<String> {
        let rest = remainder.strip_prefix(open)?;
        let end = rest.find(close)?;
        Some(rest[..end].to_string())
    };

    let (label, shape) = if let Some(text) = delimited("[[", "]]") {
        (text, "subroutine")
    } else if let Some(text) = delimited("[", "]") {
        (text, "rect")
    } else if let Some(text) = delimited("((", "))") {
        (text, "circle")
    } else if let Some(text) = delimited("(", ")") {
        (text, "round")
    } else if let Some(text) = delimited("{", "}") {
        (text, "diamond")
    } else if let Some(text) = delimited(">", "<") {
        (text, "subroutine")
    } else {
        (String::new(), "rect")
    };

    Some(NodeToken {
        id,
        label: clean_label(&label),
        shape,
        class,
    })
}

/// Pops a trailing `|label|` off an edge's left-hand segment.
fn pop_trailing_label(segment: &str) -> (String, String) {
    let trimmed = segment.trim_end();
    if let Some(without_bar) = trimmed.strip_suffix('|') {
        if let Some(open) = without_bar.rfind('|') {
            let label = clean_label(&without_bar[open + 1..]);
            return (without_bar[..open].trim().to_string(), label);
        }
    }
    (trimmed.trim().to_string(), String::new())
}

/// Pops a leading `|label|` off an edge's right-hand segment.
fn pop_leading_label(segment: &str) -> (String, String) {
    let trimmed = segment.trim_start();
    if let Some(rest) = trimmed.strip_prefix('|') {
        if let Some(end) = rest.find('|') {
            let label = clean_label(&rest[..end]);
            return (rest[end + 1..].trim().to_string(), label);
        }
    }
    (trimmed.trim().to_string(), String::new())
}

fn register_node(draft: &mut GraphDraft, token: &NodeToken, group_stack: &[String]) {
    let node = draft.ensure_node(&token.id);
    node.fill_label(&token.label);
    node.fill_shape(token.shape);
    if let Some(class) = &token.class {
        node.add_class(class);
    }
    add_to_current_group(draft, &token.id, group_stack);
}

fn add_to_current_group(draft: &mut GraphDraft, node_id: &str, group_stack: &[String]) {
    let Some(current) = group_stack.last() else {
        return;
    };
    draft.ensure_group(current).add_member(node_id);
}

/// Parses one candidate edge statement. Returns `false` when no arrow token
/// is present so the caller can fall through to node-declaration parsing.
fn parse_edge_statement(draft: &mut GraphDraft, line: &str, group_stack: &[String]) -> bool {
    let Some(arrow) = ARROW_TOKENS.iter().find(|token| line.contains(**token)) else {
        return false;
    };
    let Some((left, right)) = line.split_once(arrow) else {
        return false;
    };
    let (left, mut label) = pop_trailing_label(left);
    let (right, right_label) = pop_leading_label(right);
    if label.is_empty() {
        label = right_label;
    }
    let (Some(src), Some(dst)) = (split_node_token(&left), split_node_token(&right)) else {
        return false;
    };
    register_node(draft, &src, group_stack);
    register_node(draft, &dst, group_stack);

    // Directedness comes from the arrow glyph itself; a plain `--` link is
    // undirected even though it matches no `>` head.
    let directed = arrow.contains('>') && *arrow != "--";
    let mut edge = EdgeDraft::new(src.id, dst.id, directed);
    if !label.is_empty() {
        edge.label = Some(label);
    }
    if arrow.contains('.') {
        edge.add_style_token("dashed");
    } else if arrow.contains('=') {
        edge.add_style_token("bold");
    }
    if arrow.contains('x') {
        edge.termination = Some("cross".to_string());
    }
    edge.arrow_token = Some(arrow.to_string());
    draft.push_edge(edge);
    true
}

pub fn parse(code: &str, source_id: &str) -> GraphDraft {
    let mut draft = GraphDraft::new("flowchart", source_id);
    draft.orientation = DEFAULT_ORIENTATION;

    let lines = normalize_lines(code);
    let mut group_stack: Vec<String> = Vec::new();
    // linkStyle declarations are collected first and applied by edge index
    // once the full edge list is known.
    let mut edge_styles: Vec<(usize, crate::style::Declarations)> = Vec::new();

    for raw_line in &lines {
        let stripped = raw_line.trim();
        if stripped.is_empty() || stripped.starts_with("%%") {
            continue;
        }

        if stripped == "flowchart" || stripped == "graph" {
            continue;
        }
        if let Some(rest) = stripped
            .strip_prefix("flowchart ")
            .or_else(|| stripped.strip_prefix("graph "))
        {
            if let Ok(orientation) = rest.trim().parse() {
                draft.orientation = orientation;
            }
            continue;
        }

        if let Some(rest) = stripped.strip_prefix("classDef ") {
            let Some((class_name, decl_text)) = rest.trim().split_once(char::is_whitespace)
            else {
                draft.warn(format!("unprocessed statement: {stripped}"));
                continue;
            };
            let declarations = parse_declarations(decl_text);
            if class_name == "default" {
                draft.node_defaults.extend(declarations);
            } else {
                draft
                    .class_defs
                    .entry(class_name.to_string())
                    .or_default()
                    .extend(declarations);
            }
            continue;
        }

        if let Some(rest) = stripped.strip_prefix("linkStyle ") {
            let Some((target, decl_text)) = rest.trim().split_once(char::is_whitespace) else {
                draft.warn(format!("unprocessed statement: {stripped}"));
                continue;
            };
            let declarations = parse_declarations(decl_text);
            if target.eq_ignore_ascii_case("default") {
                draft.edge_defaults.extend(declarations);
            } else {
                for token in target.split(',') {
                    if let Ok(index) = token.trim().parse::<usize>() {
                        edge_styles.push((index, declarations.clone()));
                    }
                }
            }
            continue;
        }

        if let Some(rest) = stripped.strip_prefix("style ") {
            let Some((node_id, decl_text)) = rest.trim().split_once(char::is_whitespace) else {
                draft.warn(format!("unprocessed statement: {stripped}"));
                continue;
            };
            let declarations = parse_declarations(decl_text);
            if let Some(token) = split_node_token(node_id) {
                register_node(&mut draft, &token, &group_stack);
                draft
                    .node_mut(&token.id)
                    .expect("node just registered")
                    .inline
                    .extend(declarations);
            }
            continue;
        }

        if let Some(rest) = stripped.strip_prefix("class ") {
            let Some((node_part, class_name)) = rest.trim().split_once(char::is_whitespace)
            else {
                draft.warn(format!("unprocessed statement: {stripped}"));
                continue;
            };
            let class_name = class_name.trim();
            for node_id in node_part.split(',') {
                if let Some(token) = split_node_token(node_id) {
                    register_node(&mut draft, &token, &group_stack);
                    draft
                        .node_mut(&token.id)
                        .expect("node just registered")
                        .add_class(class_name);
                }
            }
            continue;
        }

        if stripped == "subgraph"
            || (stripped.starts_with("subgraph")
                && stripped["subgraph".len()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_whitespace))
        {
            let label = stripped["subgraph".len()..].trim();
            let group_id = slugify(label);
            {
                let group = draft.ensure_group(&group_id);
                if group.label.is_none() && !label.is_empty() {
                    group.label = Some(label.to_string());
                }
            }
            if let Some(parent_id) = group_stack.last().cloned() {
                draft
                    .group_mut(&parent_id)
                    .expect("parent group exists")
                    .add_child(&group_id);
            }
            group_stack.push(group_id);
            continue;
        }

        if stripped == "end" {
            group_stack.pop();
            continue;
        }

        if parse_edge_statement(&mut draft, stripped, &group_stack) {
            continue;
        }

        if let Some(token) = split_node_token(stripped) {
            // A bare declaration with interior whitespace but no bracketed
            // label ("click A callback") is some other statement kind.
            let bare_words = token.label.is_empty() && stripped.contains(char::is_whitespace);
            if !bare_words {
                register_node(&mut draft, &token, &group_stack);
                continue;
            }
        }

        draft.warn(format!("unprocessed statement: {stripped}"));
    }

    for (index, declarations) in edge_styles {
        match draft.edges.get_mut(index) {
            Some(edge) => edge.inline.extend(declarations),
            // Out-of-range linkStyle indices are a no-op, matching the
            // dangling-reference policy.
            None => draft.warn(format!("linkStyle index out of range: {index}")),
        }
    }

    draft
}
