//! Sequence-diagram structural parser.
//!
//! Maintains a participant registry (first-seen order defines emission
//! order), a stack of open `rect` blocks, and an ordered timeline event log.
//! Messages split on a longest-first arrow-token list; notes become
//! synthetic nodes of shape `note` tied to their participant targets.

use regex::Regex;

use crate::ir::{EdgeDraft, GraphDraft, NodeDraft, Orientation, TimelineEvent};
use crate::utils::{clean_label, normalize_lines};

/// Message arrow tokens in match order (longest first, so `-->>` is never
/// read as `-->` + `>`).
const ARROW_TOKENS: [&str; 8] = ["-->>", "->>", "-->", "->", "--x", "-x", "x--", "x-"];

fn participant_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^participant\s+(\S+)(?:\s+as\s+(.+))?$").expect("valid regex"))
}

fn note_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^note\s+(?P<position>over|right of|left of)\s+(?P<targets>[A-Za-z0-9_, ]+):\s*(?P<text>.+)$")
            .expect("valid regex")
    })
}

struct RectBlock {
    id: String,
    touched: Vec<String>,
}

impl RectBlock {
    fn touch(&mut self, id: &str) {
        if !self.touched.iter().any(|t| t == id) {
            self.touched.push(id.to_string());
        }
    }
}

fn ensure_participant(draft: &mut GraphDraft, id: &str, label: Option<&str>) {
    let newly_seen = !draft.contains_node(id);
    let node = draft.ensure_node(id);
    node.kind = Some("participant".to_string());
    node.fill_shape("rect");
    match label {
        Some(label) => node.fill_label(label),
        None => node.fill_label(id),
    }
    if newly_seen {
        draft.timeline.push(TimelineEvent::Participant {
            participant: id.to_string(),
        });
    }
}

/// Strips a `+`/`-` activation marker from a message endpoint token.
fn strip_activation(token: &str, leading: bool) -> (String, Option<&'static str>) {
    let token = token.trim();
    let (rest, marker) = if leading {
        match token.strip_prefix('+') {
            Some(rest) => (rest, Some("activate")),
            None => match token.strip_prefix('-') {
                Some(rest) => (rest, Some("deactivate")),
                None => (token, None),
            },
        }
    } else {
        match token.strip_suffix('+') {
            Some(rest) => (rest, Some("activate")),
            None => match token.strip_suffix('-') {
                Some(rest) => (rest, Some("deactivate")),
                None => (token, None),
            },
        }
    };
    (rest.trim().trim_end_matches(':').to_string(), marker)
}

pub fn parse(code: &str, source_id: &str) -> GraphDraft {
    let mut draft = GraphDraft::new("sequenceDiagram", source_id);
    draft.orientation = Orientation::TopBottom;

    let mut note_nodes: Vec<NodeDraft> = Vec::new();
    let mut rect_stack: Vec<RectBlock> = Vec::new();
    let mut finished_blocks: Vec<(RectBlock, Option<String>)> = Vec::new();
    let mut note_counter = 0usize;
    let mut block_counter = 0usize;

    for raw_line in normalize_lines(code) {
        let stripped = raw_line.trim();
        if stripped.is_empty() || stripped.starts_with("%%") || stripped == "sequenceDiagram" {
            continue;
        }

        if let Some(rest) = stripped.strip_prefix("rect ") {
            block_counter += 1;
            let id = format!("block_{block_counter}");
            let color = {
                let c = rest.trim();
                if c.is_empty() { None } else { Some(c.to_string()) }
            };
            draft.timeline.push(TimelineEvent::BlockStart { block: id.clone() });
            rect_stack.push(RectBlock {
                id: id.clone(),
                touched: Vec::new(),
            });
            // Stash the color until the block closes; membership is still
            // being collected.
            finished_blocks.push((
                RectBlock {
                    id,
                    touched: Vec::new(),
                },
                color,
            ));
            continue;
        }

        if stripped == "end" && !rect_stack.is_empty() {
            let block = rect_stack.pop().expect("rect stack non-empty");
            draft.timeline.push(TimelineEvent::BlockEnd {
                block: block.id.clone(),
            });
            if let Some(slot) = finished_blocks.iter_mut().find(|(b, _)| b.id == block.id) {
                slot.0.touched = block.touched;
            }
            continue;
        }

        if let Some(caps) = participant_regex().captures(stripped) {
            let ident = caps.get(1).expect("participant ident").as_str();
            let alias = caps.get(2).map(|m| m.as_str().trim().to_string());
            ensure_participant(&mut draft, ident, alias.as_deref());
            if let Some(alias) = alias {
                draft
                    .node_mut(ident)
                    .expect("participant registered")
                    .alias = Some(alias);
            }
            continue;
        }

        if let Some(caps) = note_regex().captures(stripped) {
            note_counter += 1;
            let note_id = format!("note_{note_counter}");
            let position = caps["position"].to_ascii_lowercase();
            let targets: Vec<String> = caps["targets"]
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            let text = clean_label(&caps["text"]);

            for target in &targets {
                ensure_participant(&mut draft, target, None);
                if let Some(block) = rect_stack.last_mut() {
                    block.touch(target);
                }
            }

            let mut note = NodeDraft::new(&note_id);
            note.label = Some(text);
            note.shape = Some("note".to_string());
            note.kind = Some("note".to_string());
            note.note_position = Some(position);
            note.participants = targets;
            note_nodes.push(note);
            draft.timeline.push(TimelineEvent::Note { note: note_id });
            continue;
        }

        let (body, remainder) = match stripped.split_once(':') {
            Some((body, remainder)) => (body, Some(remainder)),
            None => (stripped, None),
        };
        let arrow = ARROW_TOKENS.iter().find(|token| body.contains(**token));
        if let Some(arrow) = arrow {
            let (left, right) = body.split_once(arrow).expect("arrow token present");
            let (src, src_activation) = strip_activation(left, false);
            let (dst, dst_activation) = strip_activation(right, true);
            if src.is_empty() || dst.is_empty() {
                draft.warn(format!("unprocessed statement: {stripped}"));
                continue;
            }

            ensure_participant(&mut draft, &src, None);
            ensure_participant(&mut draft, &dst, None);

            let mut edge = EdgeDraft::new(&src, &dst, true);
            edge.kind = Some("sequence_message".to_string());
            edge.arrow_token = Some(arrow.to_string());
            if let Some(label) = remainder {
                let label = clean_label(label);
                if !label.is_empty() {
                    edge.label = Some(label);
                }
            }
            if arrow.contains('.') {
                edge.add_style_token("dashed");
            } else if arrow.contains('=') {
                edge.add_style_token("bold");
            }
            if arrow.contains('x') {
                edge.termination = Some("destroy".to_string());
            }
            edge.source_activation = src_activation.map(str::to_string);
            edge.target_activation = dst_activation.map(str::to_string);

            if let Some(block) = rect_stack.last_mut() {
                block.touch(&src);
                block.touch(&dst);
            }

            let edge_id = format!("e{}", draft.edges.len() + 1);
            draft.timeline.push(TimelineEvent::Message { edge: edge_id });
            draft.push_edge(edge);
            continue;
        }

        // Framed control blocks are recognized but not yet modeled.
        draft.warn(format!("unprocessed statement: {stripped}"));
    }

    // Blocks never closed by `end` keep whatever they touched so far.
    for block in rect_stack {
        if let Some(slot) = finished_blocks.iter_mut().find(|(b, _)| b.id == block.id) {
            slot.0.touched = block.touched;
        }
    }

    for (block, color) in finished_blocks {
        let group = draft.ensure_group(&block.id);
        group.label = Some(block.id.clone());
        group.fill = color;
        for id in &block.touched {
            group.add_member(id);
        }
    }

    for note in note_nodes {
        draft.push_node(note);
    }

    draft
}
