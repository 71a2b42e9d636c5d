//! Draft-to-IR finalization.
//!
//! One pass consumes a [`GraphDraft`] and produces the immutable
//! [`IrDocument`]: the style cascade is resolved per entity, edges with
//! missing endpoints are dropped with a warning, and group membership is
//! reduced to a forest (first containing group wins).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::{GraphDraft, IrDocument, IrEdge, IrGroup, IrNode, NodeDraft};
use crate::style::{self, Declarations, StyleTarget};

/// Dash pattern substituted when a style asks for "dashed" without giving
/// concrete segment lengths.
pub const DEFAULT_DASH: [f64; 2] = [6.0, 4.0];

fn style_tokens(style: Option<&str>, resolved_tokens: &[String]) -> Option<String> {
    let mut tokens: Vec<String> = style
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_string)
        .collect();
    for token in resolved_tokens {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.clone());
        }
    }
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

fn finalize_node(
    node: NodeDraft,
    node_defaults: &Declarations,
    class_defs: &indexmap::IndexMap<String, Declarations>,
    warnings: &mut Vec<String>,
) -> IrNode {
    let mut layers: Vec<&Declarations> = vec![node_defaults];
    for class in &node.classes {
        match class_defs.get(class) {
            Some(decls) => layers.push(decls),
            None => warnings.push(format!("undefined class: {class}")),
        }
    }
    layers.push(&node.inline);
    let resolved = style::resolve(&layers, StyleTarget::Node);

    let mut overrides = resolved.passthrough;
    for (key, value) in node.extras {
        overrides.insert(key, value);
    }

    let size = match (node.width, node.height) {
        (Some(w), Some(h)) => Some([w, h]),
        _ => None,
    };

    IrNode {
        label: Some(node.label.unwrap_or_else(|| node.id.clone())),
        shape: Some(node.shape.unwrap_or_else(|| "rect".to_string())),
        pos: node.pos.map(|(x, y)| [x, y]),
        size,
        fill: node.fill.or(resolved.fill),
        stroke: node.stroke.or(resolved.stroke),
        stroke_width: node.stroke_width.or(resolved.stroke_width),
        text_color: node.text_color.or(resolved.text_color),
        class: node.classes.first().cloned(),
        classes: node.classes,
        style: style_tokens(node.style.as_deref(), &resolved.tokens),
        kind: node.kind,
        alias: node.alias,
        participants: node.participants,
        note_position: node.note_position,
        overrides,
        id: node.id,
    }
}

/// Consumes a draft and produces the canonical document.
pub fn finalize(draft: GraphDraft) -> IrDocument {
    let GraphDraft {
        title,
        orientation,
        directed,
        dialect,
        nodes,
        edges,
        groups,
        mut warnings,
        timeline,
        node_defaults,
        class_defs,
        edge_defaults,
        ..
    } = draft;

    let ir_nodes: Vec<IrNode> = nodes
        .into_iter()
        .map(|n| finalize_node(n, &node_defaults, &class_defs, &mut warnings))
        .collect();

    let node_ids: FxHashSet<&str> = ir_nodes.iter().map(|n| n.id.as_str()).collect();

    let mut ir_edges = Vec::with_capacity(edges.len());
    for edge in edges {
        if !node_ids.contains(edge.from.as_str()) || !node_ids.contains(edge.to.as_str()) {
            warnings.push(format!(
                "dropped edge with unknown endpoint: {} -> {}",
                edge.from, edge.to
            ));
            continue;
        }
        let layers: Vec<&Declarations> = vec![&edge_defaults, &edge.inline];
        let resolved = style::resolve(&layers, StyleTarget::Edge);

        let style = style_tokens(edge.style.as_deref(), &resolved.tokens);
        let dashed = style
            .as_deref()
            .is_some_and(|s| s.split_whitespace().any(|t| t == "dashed"));
        let dash = edge
            .dash
            .or(resolved.dash)
            .or_else(|| dashed.then(|| DEFAULT_DASH.to_vec()));

        ir_edges.push(IrEdge {
            from: edge.from,
            to: edge.to,
            arrow: edge.directed,
            label: edge.label,
            stroke: edge.stroke.or(resolved.stroke),
            stroke_width: edge.stroke_width.or(resolved.stroke_width),
            dash,
            style,
            kind: edge.kind,
            termination: edge.termination,
            arrow_token: edge.arrow_token,
            source_activation: edge.source_activation,
            target_activation: edge.target_activation,
        });
    }

    // Group containment must be a forest: every node belongs to at most one
    // group, every group has at most one parent, and no group contains one of
    // its own ancestors. First claim wins.
    let mut claimed_nodes: FxHashMap<String, String> = FxHashMap::default();
    let mut claimed_groups: FxHashMap<String, String> = FxHashMap::default();
    let mut ir_groups = Vec::with_capacity(groups.len());
    for group in groups {
        let mut members = Vec::with_capacity(group.nodes.len());
        for node_id in group.nodes {
            if !node_ids.contains(node_id.as_str()) {
                warnings.push(format!(
                    "group {} references unknown node: {node_id}",
                    group.id
                ));
                continue;
            }
            match claimed_nodes.get(&node_id) {
                Some(owner) => warnings.push(format!(
                    "node {node_id} already grouped under {owner}; dropped from {}",
                    group.id
                )),
                None => {
                    claimed_nodes.insert(node_id.clone(), group.id.clone());
                    members.push(node_id);
                }
            }
        }
        let mut children = Vec::with_capacity(group.groups.len());
        for child in group.groups {
            if let Some(owner) = claimed_groups.get(&child) {
                warnings.push(format!(
                    "group {child} already nested under {owner}; dropped from {}",
                    group.id
                ));
                continue;
            }
            if ancestor_chain_contains(&claimed_groups, &group.id, &child) {
                warnings.push(format!(
                    "group {child} would become its own ancestor; dropped from {}",
                    group.id
                ));
                continue;
            }
            claimed_groups.insert(child.clone(), group.id.clone());
            children.push(child);
        }
        ir_groups.push(IrGroup {
            id: group.id,
            label: group.label,
            nodes: members,
            groups: children,
            fill: group.fill,
            stroke: group.stroke,
            style: group.style,
            bounding_box: group.bounding_box,
        });
    }

    IrDocument {
        title,
        orientation,
        directed,
        dialect: dialect.to_string(),
        nodes: ir_nodes,
        edges: ir_edges,
        groups: ir_groups,
        warnings,
        timeline,
    }
}

/// Walks the parent chain upward from `start`, returning true if `needle`
/// appears in it. `start == needle` covers a group nesting itself.
fn ancestor_chain_contains(
    parents: &FxHashMap<String, String>,
    start: &str,
    needle: &str,
) -> bool {
    let mut current = start;
    loop {
        if current == needle {
            return true;
        }
        match parents.get(current) {
            Some(parent) => current = parent.as_str(),
            None => return false,
        }
    }
}
