use super::{offline, parse};

const BASIC: &str = concat!(
    "\\begin{tikzpicture}\n",
    "\\node[draw, circle] (a) at (0,0) {Start};\n",
    "\\node[draw=blue, fill=yellow] (b) at (2,1) {End};\n",
    "\\draw[->] (a) -- (b);\n",
    "\\end{tikzpicture}\n",
);

#[test]
fn nodes_edges_and_options() {
    let doc = parse(BASIC);
    assert_eq!(doc.dialect, "tikz");
    let a = doc.node("a").unwrap();
    assert_eq!(a.label.as_deref(), Some("Start"));
    assert_eq!(a.shape.as_deref(), Some("circle"));
    assert_eq!(a.stroke.as_deref(), Some("#000000"));
    let b = doc.node("b").unwrap();
    assert_eq!(b.stroke.as_deref(), Some("blue"));
    assert_eq!(b.fill.as_deref(), Some("yellow"));
    let edge = &doc.edges[0];
    assert_eq!((edge.from.as_str(), edge.to.as_str()), ("a", "b"));
    assert!(edge.arrow);
}

#[test]
fn declared_positions_survive_without_renderer() {
    // `at (x,y)` coordinates come from the source text, not the renderer.
    let doc = parse(BASIC);
    assert_eq!(doc.node("a").unwrap().pos, Some([0.0, 0.0]));
    assert_eq!(doc.node("b").unwrap().pos, Some([2.0, 1.0]));
}

#[test]
fn missing_renderer_yields_single_enrichment_warning() {
    let doc = offline()
        .parse(BASIC, "test", &crate::ParseOptions::default())
        .unwrap();
    let warnings: Vec<&str> = doc.warnings.iter().map(String::as_str).collect();
    assert_eq!(warnings, vec!["tikz_enrichment_skipped:pdflatex_not_found"]);
    // Structure is intact regardless.
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.edges.len(), 1);
}

#[test]
fn style_definitions_cascade_onto_nodes() {
    let doc = parse(concat!(
        "\\tikzstyle{process}=[draw=black, fill=gray]\n",
        "\\begin{tikzpicture}\n",
        "\\node[process] (p) {Work};\n",
        "\\node[process, fill=red] (q) {Hot work};\n",
        "\\end{tikzpicture}\n",
    ));
    assert_eq!(doc.node("p").unwrap().fill.as_deref(), Some("gray"));
    assert_eq!(doc.node("p").unwrap().stroke.as_deref(), Some("black"));
    // Inline option re-declares the style key and wins.
    assert_eq!(doc.node("q").unwrap().fill.as_deref(), Some("red"));
}

#[test]
fn tikzset_style_form() {
    let doc = parse(concat!(
        "\\tikzset{hot/.style={fill=orange}}\n",
        "\\begin{tikzpicture}\n",
        "\\node[hot] (h) {H};\n",
        "\\end{tikzpicture}\n",
    ));
    assert_eq!(doc.node("h").unwrap().fill.as_deref(), Some("orange"));
}

#[test]
fn edge_keyword_grammar() {
    let doc = parse(concat!(
        "\\begin{tikzpicture}\n",
        "\\node (x) {X};\n",
        "\\node (y) {Y};\n",
        "\\path[->] (x) edge[dashed] node{link} (y);\n",
        "\\end{tikzpicture}\n",
    ));
    let edge = &doc.edges[0];
    assert_eq!((edge.from.as_str(), edge.to.as_str()), ("x", "y"));
    assert!(edge.arrow);
    assert_eq!(edge.label.as_deref(), Some("link"));
    assert!(edge.dash.is_some());
}

#[test]
fn coordinate_chain_produces_pairwise_edges() {
    let doc = parse(concat!(
        "\\begin{tikzpicture}\n",
        "\\node (a) {A}; \\node (b) {B}; \\node (c) {C};\n",
        "\\draw (a) -- (b) -- (c);\n",
        "\\end{tikzpicture}\n",
    ));
    let pairs: Vec<(&str, &str)> = doc
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(pairs, vec![("a", "b"), ("b", "c")]);
    assert!(doc.edges.iter().all(|e| !e.arrow));
}

#[test]
fn segment_labels_attach_to_their_edge() {
    let doc = parse(concat!(
        "\\begin{tikzpicture}\n",
        "\\node (a) {A}; \\node (b) {B};\n",
        "\\draw[->] (a) -- node{step} (b);\n",
        "\\end{tikzpicture}\n",
    ));
    assert_eq!(doc.edges[0].label.as_deref(), Some("step"));
}

#[test]
fn anchor_references_resolve_to_base_node() {
    let doc = parse(concat!(
        "\\begin{tikzpicture}\n",
        "\\node (a) {A}; \\node (b) {B};\n",
        "\\draw (a.north) -- (b.south);\n",
        "\\end{tikzpicture}\n",
    ));
    assert_eq!(doc.edges[0].from, "a");
    assert_eq!(doc.edges[0].to, "b");
}

#[test]
fn directed_glyph_anywhere_sets_the_picture_default() {
    // One directed statement makes bare connectors directed too.
    let doc = parse(concat!(
        "\\begin{tikzpicture}\n",
        "\\node (a) {A}; \\node (b) {B}; \\node (c) {C};\n",
        "\\draw[->] (a) -- (b);\n",
        "\\draw (b) -- (c);\n",
        "\\end{tikzpicture}\n",
    ));
    assert!(doc.directed);
    assert!(doc.edges.iter().all(|e| e.arrow));
}

#[test]
fn no_picture_environment_warns() {
    let doc = parse("\\tikz \\node (a) {A};");
    assert!(
        doc.warnings
            .iter()
            .any(|w| w.contains("no tikzpicture environment"))
    );
}

#[test]
fn dashed_option_reaches_edge_dash() {
    let doc = parse(concat!(
        "\\begin{tikzpicture}\n",
        "\\node (a) {A}; \\node (b) {B};\n",
        "\\draw[dashed] (a) -- (b);\n",
        "\\end{tikzpicture}\n",
    ));
    let edge = &doc.edges[0];
    assert!(edge.style.as_deref().unwrap().contains("dashed"));
    assert!(edge.dash.is_some());
}
