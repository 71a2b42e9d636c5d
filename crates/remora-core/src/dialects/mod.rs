//! Per-dialect structural parsers.
//!
//! Each parser consumes raw source text and produces a [`GraphDraft`]: the
//! shared pre-normalization representation that the style cascade and
//! geometry enrichment then operate on.

pub mod dot;
pub mod flowchart;
pub mod mindmap;
pub mod sequence;
pub mod tikz;

use crate::detect::Dialect;
use crate::ir::GraphDraft;
use crate::render::Renderer;

/// Runs the structural parser for `dialect`. Only the graphviz dialect
/// touches the renderer here; the other dialects parse purely and pick up
/// geometry in a later enrichment pass.
pub fn parse(
    dialect: Dialect,
    code: &str,
    source_id: &str,
    renderer: &dyn Renderer,
    execute: bool,
) -> GraphDraft {
    match dialect {
        Dialect::Flowchart => flowchart::parse(code, source_id),
        Dialect::Sequence => sequence::parse(code, source_id),
        Dialect::Mindmap => mindmap::parse(code, source_id),
        Dialect::Tikz => tikz::parse(code, source_id),
        Dialect::Dot if execute => dot::parse_with_layout(code, source_id, renderer),
        Dialect::Dot => dot::parse(code, source_id),
    }
}
