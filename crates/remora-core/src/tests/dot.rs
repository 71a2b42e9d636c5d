use std::sync::Arc;

use serde_json::json;

use super::{parse, structural};
use crate::render::{RenderError, RenderResult, Renderer};
use crate::{ParseOptions, Pipeline};

const BUILDER: &str = concat!(
    "import graphviz\n",
    "g = graphviz.Digraph()\n",
    "g.attr(rankdir='LR')\n",
    "g.node('a', 'Start', shape='box')\n",
    "g.node('b', 'Finish', shape='doublecircle', color='red')\n",
    "g.edge('a', 'b', 'go', style='dashed')\n",
    "g.view()\n",
);

#[test]
fn static_scan_recovers_structure() {
    let doc = parse(BUILDER);
    assert_eq!(doc.dialect, "graphviz");
    assert_eq!(doc.orientation.as_str(), "LR");
    assert!(doc.directed);

    let a = doc.node("a").unwrap();
    assert_eq!(a.label.as_deref(), Some("Start"));
    assert_eq!(a.shape.as_deref(), Some("rect"));
    let b = doc.node("b").unwrap();
    assert_eq!(b.shape.as_deref(), Some("double-circle"));
    assert_eq!(b.stroke.as_deref(), Some("red"));

    let edge = &doc.edges[0];
    assert_eq!(edge.label.as_deref(), Some("go"));
    assert!(edge.arrow);
    assert!(edge.dash.is_some());
}

#[test]
fn undirected_builder_graph() {
    let doc = parse("import graphviz\ng = graphviz.Graph()\ng.edge('x', 'y')");
    assert!(!doc.directed);
    assert!(!doc.edges[0].arrow);
}

#[test]
fn dynamic_arguments_are_flagged_not_guessed() {
    let doc = parse(concat!(
        "import graphviz\n",
        "g = graphviz.Digraph()\n",
        "for name in names:\n",
        "    g.node(name)\n",
        "g.node('fixed')\n",
    ));
    assert_eq!(doc.nodes.len(), 1);
    assert!(doc.warnings.iter().any(|w| w.contains("dynamic")));
}

#[test]
fn instrument_finds_digraph_and_graph_variables() {
    let directed = crate::dialects::dot::instrument_builder(BUILDER).unwrap();
    assert!(directed.contains("_g = g"));
    assert!(directed.contains("print(_g.source)"));

    let undirected =
        crate::dialects::dot::instrument_builder("import graphviz\nnet = graphviz.Graph()\n")
            .unwrap();
    assert!(undirected.contains("_g = net"));
}

#[test]
fn missing_interpreter_falls_back_with_warning() {
    let doc = super::offline()
        .parse(BUILDER, "test", &ParseOptions::default())
        .unwrap();
    assert!(
        doc.warnings
            .iter()
            .any(|w| w == "dot_layout_skipped:python3_not_found")
    );
    // Structure still recovered statically.
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.edges.len(), 1);
}

/// Pretends python3 and `dot -Tjson` both work, returning a canned layout.
struct LayoutStub;

impl Renderer for LayoutStub {
    fn compile_tex(&self, _document: &str) -> RenderResult<String> {
        Err(RenderError::ToolMissing("pdflatex"))
    }

    fn run_builder(&self, _program: &str) -> RenderResult<String> {
        Ok("digraph { rankdir=LR; a -> b; }".to_string())
    }

    fn layout_graph(&self, _dot_source: &str) -> RenderResult<serde_json::Value> {
        Ok(json!({
            "name": "pipeline",
            "directed": true,
            "objects": [
                {
                    "_gvid": 0,
                    "name": "cluster_main",
                    "nodes": [1, 2],
                    "bb": "0,0,200,120",
                    "label": "Main"
                },
                {
                    "_gvid": 1,
                    "name": "a",
                    "label": "Start",
                    "shape": "box",
                    "pos": "54,90",
                    "width": "1.0",
                    "height": "0.5"
                },
                {
                    "_gvid": 2,
                    "name": "b",
                    "pos": "150,30",
                    "width": "0.75",
                    "height": "0.5",
                    "fillcolor": "lightblue",
                    "style": "filled,dashed"
                }
            ],
            "edges": [
                { "_gvid": 0, "tail": 1, "head": 2, "label": "go" }
            ]
        }))
    }

    fn render_svg(&self, _code: &str) -> RenderResult<String> {
        Err(RenderError::ToolMissing("mmdc"))
    }
}

#[test]
fn json_layout_path_reconstructs_geometry() {
    let pipeline = Pipeline::with_renderer(Arc::new(LayoutStub));
    let doc = pipeline
        .parse(BUILDER, "test", &ParseOptions::default())
        .unwrap();

    assert_eq!(doc.title, "pipeline");
    assert_eq!(doc.orientation.as_str(), "LR");
    assert!(doc.warnings.is_empty());

    let a = doc.node("a").unwrap();
    assert_eq!(a.label.as_deref(), Some("Start"));
    assert_eq!(a.shape.as_deref(), Some("rect"));
    assert_eq!(a.pos, Some([54.0, 90.0]));
    // Inches scale to points.
    assert_eq!(a.size, Some([72.0, 36.0]));

    let b = doc.node("b").unwrap();
    assert_eq!(b.label.as_deref(), Some("b"));
    assert_eq!(b.fill.as_deref(), Some("lightblue"));
    assert!(b.style.as_deref().unwrap().contains("dashed"));

    let group = doc.group("cluster_main").unwrap();
    assert_eq!(group.label.as_deref(), Some("Main"));
    assert_eq!(group.nodes, vec!["a".to_string(), "b".to_string()]);
    let bb = group.bounding_box.unwrap();
    assert_eq!((bb.width, bb.height), (200.0, 120.0));

    let edge = &doc.edges[0];
    assert_eq!((edge.from.as_str(), edge.to.as_str()), ("a", "b"));
    assert_eq!(edge.label.as_deref(), Some("go"));
}

#[test]
fn geometry_disabled_skips_execution_entirely() {
    // With enrichment off the interpreter is never consulted, so a broken
    // renderer cannot produce warnings.
    let pipeline = Pipeline::with_renderer(Arc::new(LayoutStub));
    let doc = pipeline.parse(BUILDER, "test", &structural()).unwrap();
    assert!(doc.warnings.is_empty());
    assert!(doc.node("a").unwrap().pos.is_none());
}
