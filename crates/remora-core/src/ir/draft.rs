//! Mutable accumulation layer used while a dialect parser walks its input.
//!
//! Drafts collect optional fields and ephemeral style-declaration bags; a
//! single [`crate::normalize::finalize`] pass consumes the whole draft and
//! produces the immutable [`super::IrDocument`]. Nothing downstream of
//! finalize mutates entities.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::{BoundingBox, Orientation, TimelineEvent};
use crate::style::Declarations;

#[derive(Debug, Clone, Default)]
pub struct NodeDraft {
    pub id: String,
    pub label: Option<String>,
    pub shape: Option<String>,
    pub classes: Vec<String>,
    /// Space-separated style keywords ("dashed bold").
    pub style: Option<String>,
    pub pos: Option<(f64, f64)>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub stroke_width: Option<f64>,
    pub text_color: Option<String>,
    pub kind: Option<String>,
    pub alias: Option<String>,
    pub participants: Vec<String>,
    pub note_position: Option<String>,
    /// Inline (highest-precedence) style declarations.
    pub inline: Declarations,
    /// Extra pass-through values outside the style cascade (icons, layout hints).
    pub extras: IndexMap<String, String>,
}

impl NodeDraft {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Re-declarations fill empty fields only; the first label wins.
    pub fn fill_label(&mut self, label: &str) {
        if !label.is_empty() && self.label.as_deref().unwrap_or("").is_empty() {
            self.label = Some(label.to_string());
        }
    }

    /// Re-declarations fill empty fields only; the first shape wins.
    pub fn fill_shape(&mut self, shape: &str) {
        if self.shape.is_none() {
            self.shape = Some(shape.to_string());
        }
    }

    pub fn add_class(&mut self, class: &str) {
        let class = class.trim();
        if !class.is_empty() && !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn add_style_token(&mut self, token: &str) {
        let mut tokens: Vec<String> = self
            .style
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
        self.style = Some(tokens.join(" "));
    }
}

#[derive(Debug, Clone, Default)]
pub struct EdgeDraft {
    pub from: String,
    pub to: String,
    pub directed: bool,
    pub label: Option<String>,
    pub style: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub dash: Option<Vec<f64>>,
    pub kind: Option<String>,
    pub termination: Option<String>,
    pub arrow_token: Option<String>,
    pub source_activation: Option<String>,
    pub target_activation: Option<String>,
    pub inline: Declarations,
}

impl EdgeDraft {
    pub fn new(from: impl Into<String>, to: impl Into<String>, directed: bool) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            directed,
            ..Self::default()
        }
    }

    pub fn add_style_token(&mut self, token: &str) {
        let mut tokens: Vec<String> = self
            .style
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
        self.style = Some(tokens.join(" "));
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupDraft {
    pub id: String,
    pub label: Option<String>,
    pub nodes: Vec<String>,
    pub groups: Vec<String>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub style: Option<String>,
    pub bounding_box: Option<BoundingBox>,
}

impl GroupDraft {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Membership is deduplicated with insertion order preserved.
    pub fn add_member(&mut self, node_id: &str) {
        if !self.nodes.iter().any(|n| n == node_id) {
            self.nodes.push(node_id.to_string());
        }
    }

    pub fn add_child(&mut self, group_id: &str) {
        if !self.groups.iter().any(|g| g == group_id) {
            self.groups.push(group_id.to_string());
        }
    }
}

#[derive(Debug, Default)]
pub struct GraphDraft {
    pub title: String,
    pub orientation: Orientation,
    pub directed: bool,
    pub dialect: &'static str,
    pub nodes: Vec<NodeDraft>,
    pub edges: Vec<EdgeDraft>,
    pub groups: Vec<GroupDraft>,
    pub warnings: Vec<String>,
    pub timeline: Vec<TimelineEvent>,
    /// Dialect-default node declarations (lowest cascade layer).
    pub node_defaults: Declarations,
    /// Named class declaration layers.
    pub class_defs: IndexMap<String, Declarations>,
    /// Default edge declarations applied to every edge.
    pub edge_defaults: Declarations,
    node_index: FxHashMap<String, usize>,
    group_index: FxHashMap<String, usize>,
}

impl GraphDraft {
    pub fn new(dialect: &'static str, title: impl Into<String>) -> Self {
        Self {
            dialect,
            title: title.into(),
            directed: true,
            ..Self::default()
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeDraft> {
        let idx = *self.node_index.get(id)?;
        self.nodes.get_mut(idx)
    }

    /// Returns the existing node or inserts a fresh draft for `id`.
    pub fn ensure_node(&mut self, id: &str) -> &mut NodeDraft {
        if let Some(&idx) = self.node_index.get(id) {
            return &mut self.nodes[idx];
        }
        let idx = self.nodes.len();
        self.nodes.push(NodeDraft::new(id));
        self.node_index.insert(id.to_string(), idx);
        &mut self.nodes[idx]
    }

    pub fn push_node(&mut self, node: NodeDraft) {
        if let Some(&idx) = self.node_index.get(&node.id) {
            self.nodes[idx] = node;
            return;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn push_edge(&mut self, edge: EdgeDraft) {
        self.edges.push(edge);
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut GroupDraft> {
        let idx = *self.group_index.get(id)?;
        self.groups.get_mut(idx)
    }

    pub fn ensure_group(&mut self, id: &str) -> &mut GroupDraft {
        if let Some(&idx) = self.group_index.get(id) {
            return &mut self.groups[idx];
        }
        let idx = self.groups.len();
        self.groups.push(GroupDraft::new(id));
        self.group_index.insert(id.to_string(), idx);
        &mut self.groups[idx]
    }
}
