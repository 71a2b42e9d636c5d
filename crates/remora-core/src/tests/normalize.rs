use super::{offline, parse, structural};
use crate::ir::{EdgeDraft, GraphDraft, NodeDraft};
use crate::normalize::finalize;
use crate::{Dialect, Error};

#[test]
fn empty_input_is_the_only_fatal_error() {
    let err = offline().parse("   \n\t", "test", &structural()).unwrap_err();
    assert!(matches!(err, Error::EmptyInput));
}

#[test]
fn parse_as_skips_detection() {
    let doc = offline()
        .parse_as(Dialect::Flowchart, "A-->B", "test", &structural())
        .unwrap();
    assert_eq!(doc.nodes.len(), 2);
}

#[test]
fn source_id_becomes_title() {
    let doc = offline()
        .parse("flowchart LR\nA-->B", "diagrams/login.mmd", &structural())
        .unwrap();
    assert_eq!(doc.title, "diagrams/login.mmd");
}

#[test]
fn dangling_edges_are_dropped_with_warning() {
    let mut draft = GraphDraft::new("flowchart", "test");
    draft.push_node(NodeDraft::new("a"));
    draft.push_edge(EdgeDraft::new("a", "ghost", true));
    let doc = finalize(draft);
    assert!(doc.edges.is_empty());
    assert!(doc.warnings.iter().any(|w| w.contains("ghost")));
}

#[test]
fn every_emitted_edge_references_existing_nodes() {
    let doc = parse(concat!(
        "flowchart LR\n",
        "A-->B\n",
        "B-->C\n",
        "C-->A\n",
    ));
    for edge in &doc.edges {
        assert!(doc.node(&edge.from).is_some());
        assert!(doc.node(&edge.to).is_some());
    }
}

#[test]
fn node_ids_are_unique_across_dialects() {
    for source in [
        "flowchart LR\nA-->B\nA-->C\nA[Again]",
        "sequenceDiagram\nA->>B: x\nB->>A: y",
        "mindmap\nroot\n  dup\n  dup",
    ] {
        let doc = parse(source);
        let mut seen = std::collections::HashSet::new();
        for node in &doc.nodes {
            assert!(seen.insert(&node.id), "duplicate id {}", node.id);
        }
    }
}

#[test]
fn node_claimed_by_two_groups_keeps_the_first() {
    let mut draft = GraphDraft::new("flowchart", "test");
    draft.push_node(NodeDraft::new("n"));
    draft.ensure_group("g1").add_member("n");
    draft.ensure_group("g2").add_member("n");
    let doc = finalize(draft);
    assert_eq!(doc.group("g1").unwrap().nodes, vec!["n".to_string()]);
    assert!(doc.group("g2").unwrap().nodes.is_empty());
    assert!(doc.warnings.iter().any(|w| w.contains("already grouped")));
}

#[test]
fn group_nesting_is_a_forest() {
    let mut draft = GraphDraft::new("flowchart", "test");
    draft.ensure_group("outer").add_child("inner");
    draft.ensure_group("other").add_child("inner");
    draft.ensure_group("inner");
    let doc = finalize(draft);
    assert_eq!(doc.group("outer").unwrap().groups, vec!["inner".to_string()]);
    assert!(doc.group("other").unwrap().groups.is_empty());
}

#[test]
fn group_nesting_itself_is_dropped() {
    let mut draft = GraphDraft::new("flowchart", "test");
    draft.ensure_group("loop").add_child("loop");
    let doc = finalize(draft);
    assert!(doc.group("loop").unwrap().groups.is_empty());
    assert!(doc.warnings.iter().any(|w| w.contains("own ancestor")));
}

#[test]
fn mutual_group_nesting_keeps_one_direction() {
    let mut draft = GraphDraft::new("flowchart", "test");
    draft.ensure_group("a").add_child("b");
    draft.ensure_group("b").add_child("a");
    let doc = finalize(draft);
    assert_eq!(doc.group("a").unwrap().groups, vec!["b".to_string()]);
    assert!(doc.group("b").unwrap().groups.is_empty());
    assert!(doc.warnings.iter().any(|w| w.contains("own ancestor")));
}

#[test]
fn first_class_collapses_into_class_field() {
    let mut draft = GraphDraft::new("flowchart", "test");
    let node = draft.ensure_node("a");
    node.add_class("primary");
    node.add_class("secondary");
    let doc = finalize(draft);
    let a = doc.node("a").unwrap();
    assert_eq!(a.class.as_deref(), Some("primary"));
    assert_eq!(a.classes, vec!["primary".to_string(), "secondary".to_string()]);
}

#[test]
fn undefined_class_reference_is_a_noop_with_warning() {
    let doc = parse("flowchart LR\nA-->B\nclass A missing");
    let a = doc.node("A").unwrap();
    assert!(a.fill.is_none());
    assert_eq!(a.class.as_deref(), Some("missing"));
    assert!(doc.warnings.iter().any(|w| w.contains("undefined class")));
}

#[test]
fn dash_keyword_without_values_gets_default_pattern() {
    let mut draft = GraphDraft::new("flowchart", "test");
    draft.push_node(NodeDraft::new("a"));
    draft.push_node(NodeDraft::new("b"));
    let mut edge = EdgeDraft::new("a", "b", true);
    edge.add_style_token("dashed");
    draft.push_edge(edge);
    let doc = finalize(draft);
    assert_eq!(doc.edges[0].dash, Some(vec![6.0, 4.0]));
}

#[test]
fn explicit_dash_values_beat_the_default() {
    let doc = parse("flowchart LR\nlinkStyle default stroke-dasharray:3 7\nA-->B");
    assert_eq!(doc.edges[0].dash, Some(vec![3.0, 7.0]));
}

#[test]
fn labels_and_shapes_always_present_on_nodes() {
    let doc = parse("flowchart LR\nA-->B");
    for node in &doc.nodes {
        assert!(node.label.is_some());
        assert!(node.shape.is_some());
    }
}

#[test]
fn unrecognized_style_keys_pass_through() {
    let doc = parse("flowchart LR\nA-->B\nstyle A corner-radius:8");
    let a = doc.node("A").unwrap();
    assert_eq!(
        a.overrides.get("corner-radius").map(String::as_str),
        Some("8")
    );
}

#[test]
fn serialized_document_uses_minimal_schema() {
    let doc = parse("flowchart LR\nA-->|go|B");
    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["orientation"], "LR");
    assert_eq!(value["nodes"][0]["id"], "A");
    assert_eq!(value["edges"][0]["from"], "A");
    assert_eq!(value["edges"][0]["arrow"], true);
    assert_eq!(value["edges"][0]["label"], "go");
    // Absent optionals are omitted, not null.
    assert!(value["nodes"][0].get("pos").is_none());
    assert!(value["edges"][0].get("dash").is_none());
    assert!(value.get("groups").is_none());
}
