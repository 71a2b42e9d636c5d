//! Canonical minimal IR.
//!
//! Every dialect converges to [`IrDocument`]. Serialization uses camelCase
//! field spellings and skips absent fields, so the emitted JSON is the
//! minimal schema consumed by code emitters.

pub mod draft;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use draft::{EdgeDraft, GraphDraft, GroupDraft, NodeDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::TopBottom => "TB",
            Orientation::BottomTop => "BT",
            Orientation::LeftRight => "LR",
            Orientation::RightLeft => "RL",
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "TD" is Mermaid's legacy alias for top-to-bottom.
        match s {
            "TB" | "TD" => Ok(Orientation::TopBottom),
            "BT" => Ok(Orientation::BottomTop),
            "LR" => Ok(Orientation::LeftRight),
            "RL" => Ok(Orientation::RightLeft),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Center position; present only together with `size` unless the source
    /// provided a position alone (position/size are both-or-neither once a
    /// size exists).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(rename = "strokeWidth", skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(rename = "textColor", skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// First class tag, collapsed out of the class list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<String>,
    #[serde(rename = "notePosition", skip_serializing_if = "Option::is_none")]
    pub note_position: Option<String>,
    /// Pass-through declarations no stage recognized.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub overrides: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrEdge {
    pub from: String,
    pub to: String,
    /// Directedness flag ("arrow" in the minimal schema).
    pub arrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(rename = "strokeWidth", skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<String>,
    #[serde(rename = "arrowToken", skip_serializing_if = "Option::is_none")]
    pub arrow_token: Option<String>,
    #[serde(rename = "sourceActivation", skip_serializing_if = "Option::is_none")]
    pub source_activation: Option<String>,
    #[serde(rename = "targetActivation", skip_serializing_if = "Option::is_none")]
    pub target_activation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrGroup {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
    /// Nested child group ids; the containment relation is a forest.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(rename = "boundingBox", skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Auxiliary ordering metadata emitted by the sequence dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    Participant { participant: String },
    Message { edge: String },
    Note { note: String },
    BlockStart { block: String },
    BlockEnd { block: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrDocument {
    pub title: String,
    pub orientation: Orientation,
    pub directed: bool,
    pub dialect: String,
    pub nodes: Vec<IrNode>,
    pub edges: Vec<IrEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<IrGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(
        rename = "sequenceTimeline",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub timeline: Vec<TimelineEvent>,
}

impl IrDocument {
    pub fn node(&self, id: &str) -> Option<&IrNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&IrGroup> {
        self.groups.iter().find(|g| g.id == id)
    }
}
