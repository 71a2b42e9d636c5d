use super::parse;
use crate::ir::TimelineEvent;

#[test]
fn participants_and_message() {
    let doc = parse("sequenceDiagram\nparticipant X\nX->>Y: hi");
    assert_eq!(doc.dialect, "sequenceDiagram");
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.nodes[0].id, "X");
    assert_eq!(doc.nodes[1].id, "Y");
    assert_eq!(doc.nodes[0].kind.as_deref(), Some("participant"));
    let edge = &doc.edges[0];
    assert!(edge.arrow);
    assert_eq!(edge.label.as_deref(), Some("hi"));
    assert_eq!(edge.kind.as_deref(), Some("sequence_message"));
}

#[test]
fn participant_alias_is_kept() {
    let doc = parse("sequenceDiagram\nparticipant A as Alice\nA->>A: think");
    let a = doc.node("A").unwrap();
    assert_eq!(a.alias.as_deref(), Some("Alice"));
}

#[test]
fn first_seen_order_defines_emission_order() {
    let doc = parse("sequenceDiagram\nB->>A: first\nA->>C: second");
    let ids: Vec<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A", "C"]);
}

#[test]
fn reply_arrow_stays_solid() {
    // `--` in a sequence arrow is just the reply variant, not a dash style.
    let doc = parse("sequenceDiagram\nA-->>B: done");
    let edge = &doc.edges[0];
    assert!(edge.style.is_none());
    assert!(edge.dash.is_none());
    assert_eq!(edge.arrow_token.as_deref(), Some("-->>"));
}

#[test]
fn cross_arrow_is_destroy() {
    let doc = parse("sequenceDiagram\nA-xB: kill");
    assert_eq!(doc.edges[0].termination.as_deref(), Some("destroy"));
}

#[test]
fn activation_markers() {
    let doc = parse("sequenceDiagram\nA->>+B: start\nB->>-A: finish");
    assert_eq!(doc.edges[0].target_activation.as_deref(), Some("activate"));
    assert_eq!(
        doc.edges[1].target_activation.as_deref(),
        Some("deactivate")
    );
}

#[test]
fn notes_become_synthetic_nodes() {
    let doc = parse("sequenceDiagram\nA->>B: hi\nNote over A,B: both of them");
    let note = doc.node("note_1").unwrap();
    assert_eq!(note.shape.as_deref(), Some("note"));
    assert_eq!(note.label.as_deref(), Some("both of them"));
    assert_eq!(note.note_position.as_deref(), Some("over"));
    assert_eq!(note.participants, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn note_registers_unseen_participant() {
    let doc = parse("sequenceDiagram\nNote right of Z: alone");
    assert!(doc.node("Z").is_some());
    assert_eq!(
        doc.node("note_1").unwrap().note_position.as_deref(),
        Some("right of")
    );
}

#[test]
fn rect_blocks_become_groups() {
    let doc = parse(concat!(
        "sequenceDiagram\n",
        "A->>B: outside\n",
        "rect rgb(230, 230, 255)\n",
        "B->>C: inside\n",
        "C->>B: back\n",
        "end\n",
    ));
    let group = doc.group("block_1").unwrap();
    assert_eq!(group.fill.as_deref(), Some("rgb(230, 230, 255)"));
    assert_eq!(group.nodes, vec!["B".to_string(), "C".to_string()]);
}

#[test]
fn timeline_orders_events() {
    let doc = parse(concat!(
        "sequenceDiagram\n",
        "participant A\n",
        "A->>B: hi\n",
        "Note over B: noted\n",
    ));
    assert_eq!(doc.timeline.len(), 4);
    assert!(matches!(
        doc.timeline[0],
        TimelineEvent::Participant { ref participant } if participant == "A"
    ));
    assert!(matches!(
        doc.timeline[1],
        TimelineEvent::Participant { ref participant } if participant == "B"
    ));
    assert!(matches!(doc.timeline[2], TimelineEvent::Message { ref edge } if edge == "e1"));
    assert!(matches!(doc.timeline[3], TimelineEvent::Note { ref note } if note == "note_1"));
}

#[test]
fn unsupported_blocks_warn_but_do_not_fail() {
    let doc = parse("sequenceDiagram\nloop Every minute\nA->>B: tick\nend");
    assert_eq!(doc.edges.len(), 1);
    assert!(doc.warnings.iter().any(|w| w.contains("loop Every minute")));
}
