//! Dialect classification.
//!
//! A [`DetectorRegistry`] runs an ordered list of detector functions over
//! comment-stripped source text; the first match selects the structural
//! parser. The order is significant: TikZ and graph-builder programs are
//! recognized by unambiguous markers before the Mermaid-style header
//! keywords are tried.

use regex::Regex;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Flowchart,
    Sequence,
    Mindmap,
    Tikz,
    Dot,
}

impl Dialect {
    pub fn id(self) -> &'static str {
        match self {
            Dialect::Flowchart => "flowchart",
            Dialect::Sequence => "sequenceDiagram",
            Dialect::Mindmap => "mindmap",
            Dialect::Tikz => "tikz",
            Dialect::Dot => "graphviz",
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "flowchart" | "graph" => Ok(Dialect::Flowchart),
            "sequence" | "sequenceDiagram" => Ok(Dialect::Sequence),
            "mindmap" => Ok(Dialect::Mindmap),
            "tikz" | "latex" => Ok(Dialect::Tikz),
            "dot" | "graphviz" => Ok(Dialect::Dot),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

pub type DetectorFn = fn(text: &str) -> bool;

#[derive(Debug, Clone)]
pub struct Detector {
    pub dialect: Dialect,
    pub detector: DetectorFn,
}

#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
    comment_re: Regex,
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::default_dialects()
    }
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            comment_re: Regex::new(r"(?m)^\s*%%.*$").expect("valid regex"),
        }
    }

    pub fn add(&mut self, dialect: Dialect, detector: DetectorFn) {
        self.detectors.push(Detector { dialect, detector });
    }

    /// The supported dialect set, in registration order.
    pub fn default_dialects() -> Self {
        let mut reg = Self::new();
        reg.add(Dialect::Tikz, detector_tikz);
        reg.add(Dialect::Dot, detector_dot);
        reg.add(Dialect::Mindmap, detector_mindmap);
        reg.add(Dialect::Sequence, detector_sequence);
        reg.add(Dialect::Flowchart, detector_flowchart);
        reg
    }

    pub fn detect(&self, text: &str) -> Result<Dialect> {
        let cleaned = self.comment_re.replace_all(text, "").to_string();
        for det in &self.detectors {
            if (det.detector)(&cleaned) {
                return Ok(det.dialect);
            }
        }
        Err(Error::UnknownDialect {
            text: cleaned.trim().chars().take(120).collect(),
        })
    }
}

fn first_statement(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

fn detector_tikz(text: &str) -> bool {
    text.contains(r"\begin{tikzpicture}") || text.contains(r"\tikz")
}

fn detector_dot(text: &str) -> bool {
    if text.contains("import graphviz") || text.contains("from graphviz") {
        return true;
    }
    let first = first_statement(text);
    first.starts_with("digraph")
        || (first.starts_with("graph") && first.trim_end().ends_with('{'))
        || (first.starts_with("strict ") && first.contains("graph"))
}

fn detector_mindmap(text: &str) -> bool {
    let first = first_statement(text);
    first == "mindmap" || first.starts_with("mindmap ")
}

fn detector_sequence(text: &str) -> bool {
    first_statement(text).starts_with("sequenceDiagram")
}

fn detector_flowchart(text: &str) -> bool {
    let first = first_statement(text);
    if first.starts_with("flowchart") {
        return true;
    }
    if let Some(rest) = first.strip_prefix("graph") {
        let rest = rest.trim();
        // Distinguish the Mermaid header from DOT's `graph name {`.
        return rest.is_empty()
            || rest
                .split_whitespace()
                .next()
                .is_some_and(|tok| matches!(tok, "TB" | "TD" | "BT" | "LR" | "RL"));
    }
    false
}
