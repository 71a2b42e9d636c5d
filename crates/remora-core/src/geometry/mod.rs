//! Geometry enrichment.
//!
//! Structural parsing leaves most nodes without coordinates. This module
//! fills them in by invoking the dialect's native renderer and reading the
//! result back: a pdflatex run with anchor instrumentation for TikZ, and an
//! SVG render for the Mermaid dialects. Every failure mode degrades to a
//! warning on the draft; enrichment never fails a parse.

use std::sync::OnceLock;

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::ir::GraphDraft;
use crate::render::{RenderError, Renderer};
use crate::utils::{clean_label, parse_translate, to_float};

const ANCHORS: [&str; 5] = ["center", "east", "west", "north", "south"];

fn tikz_library_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\usetikzlibrary\{([^}]*)\}").expect("valid regex"))
}

/// `\usetikzlibrary` names declared anywhere in the source, order-preserving
/// and deduplicated. Comma lists are split into individual libraries.
fn collect_tikz_libraries(code: &str) -> Vec<String> {
    let mut libraries = Vec::new();
    for caps in tikz_library_regex().captures_iter(code) {
        for name in caps[1].split(',') {
            let name = name.trim();
            if !name.is_empty() && !libraries.iter().any(|l| l == name) {
                libraries.push(name.to_string());
            }
        }
    }
    libraries
}

/// Wraps TikZ source in a standalone document that records the five cardinal
/// anchors of every named node into a `.pos` sidecar file.
pub(crate) fn instrument_tikz(code: &str, node_ids: &[String]) -> String {
    let (preamble, body) = match code.find(r"\begin{document}") {
        Some(_) => {
            // Full document: reuse the author's preamble up to the body.
            let start = code.find(r"\documentclass").unwrap_or(0);
            let end = code.find(r"\begin{document}").unwrap_or(0);
            (code[start..end].to_string(), extract_picture(code))
        }
        None => (String::new(), extract_picture(code)),
    };

    let mut tex = String::new();
    if preamble.contains(r"\documentclass") {
        tex.push_str(&preamble);
    } else {
        // Synthesized preamble: carry over every library the author loaded,
        // since the picture body still refers to them.
        tex.push_str("\\documentclass{standalone}\n\\usepackage{tikz}\n");
        for library in collect_tikz_libraries(code) {
            tex.push_str(&format!("\\usetikzlibrary{{{library}}}\n"));
        }
        tex.push_str(&preamble);
    }
    if !tex.contains(r"\usetikzlibrary{calc}") {
        tex.push_str("\\usetikzlibrary{calc}\n");
    }
    tex.push_str("\\newwrite\\posfile\n");
    tex.push_str("\\immediate\\openout\\posfile=diagram.pos\n");
    tex.push_str("\\begin{document}\n");

    // Re-open the picture with the anchor probes appended before \end.
    let trimmed = body.trim_end();
    let body_without_end = trimmed
        .strip_suffix(r"\end{tikzpicture}")
        .unwrap_or(trimmed);
    tex.push_str(body_without_end);
    tex.push('\n');
    for id in node_ids {
        for anchor in ANCHORS {
            tex.push_str(&format!(
                "\\path let \\p1 = ({id}.{anchor}) in \\pgfextra{{\\immediate\\write\\posfile{{{id}|{anchor}|\\x1|\\y1}}}};\n"
            ));
        }
    }
    tex.push_str("\\end{tikzpicture}\n");
    tex.push_str("\\immediate\\closeout\\posfile\n");
    tex.push_str("\\end{document}\n");
    tex
}

/// The `tikzpicture` environment including its `\begin`/`\end` markers.
fn extract_picture(code: &str) -> String {
    let start = code.find(r"\begin{tikzpicture}").unwrap_or(0);
    let end = code
        .find(r"\end{tikzpicture}")
        .map_or(code.len(), |i| i + r"\end{tikzpicture}".len());
    code[start..end].to_string()
}

#[derive(Default)]
struct AnchorSet {
    center: Option<(f64, f64)>,
    east: Option<f64>,
    west: Option<f64>,
    north: Option<f64>,
    south: Option<f64>,
}

/// Parses `id|anchor|x|y` records, coordinates in TeX points.
fn parse_pos_records(records: &str) -> FxHashMap<String, AnchorSet> {
    let mut anchors: FxHashMap<String, AnchorSet> = FxHashMap::default();
    for line in records.lines() {
        let parts: Vec<&str> = line.trim().split('|').collect();
        let [id, anchor, x, y] = parts[..] else {
            continue;
        };
        let (Some(x), Some(y)) = (to_float(x), to_float(y)) else {
            continue;
        };
        let set = anchors.entry(id.to_string()).or_default();
        match anchor {
            "center" => set.center = Some((x, y)),
            "east" => set.east = Some(x),
            "west" => set.west = Some(x),
            "north" => set.north = Some(y),
            "south" => set.south = Some(y),
            _ => {}
        }
    }
    anchors
}

/// Runs pdflatex over an instrumented copy of the source and copies measured
/// centers and extents onto the draft's nodes.
pub fn enrich_tikz(draft: &mut GraphDraft, code: &str, renderer: &dyn Renderer) {
    let ids: Vec<String> = draft.nodes.iter().map(|n| n.id.clone()).collect();
    if ids.is_empty() {
        return;
    }
    let tex = instrument_tikz(code, &ids);
    let records = match renderer.compile_tex(&tex) {
        Ok(records) => records,
        Err(err) => {
            draft.warn(skip_warning("tikz_enrichment_skipped", &err));
            return;
        }
    };
    let anchors = parse_pos_records(&records);
    for node in &mut draft.nodes {
        let Some(set) = anchors.get(&node.id) else {
            continue;
        };
        if let Some(center) = set.center {
            node.pos = Some(center);
        }
        if let (Some(east), Some(west)) = (set.east, set.west) {
            node.width = Some((east - west).abs());
        }
        if let (Some(north), Some(south)) = (set.north, set.south) {
            node.height = Some((north - south).abs());
        }
    }
}

struct SvgNode {
    id: String,
    label: String,
    center: (f64, f64),
    size: Option<(f64, f64)>,
}

fn collect_text(node: roxmltree::Node<'_, '_>, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            if let Some(text) = child.text() {
                out.push_str(text);
                out.push(' ');
            }
        } else {
            collect_text(child, out);
        }
    }
}

fn class_is_node(class: &str) -> bool {
    class
        .split_whitespace()
        .any(|c| c == "node" || c == "actor" || c == "note" || c == "mindmap-node")
}

fn extract_svg_nodes(svg: &str) -> Result<Vec<SvgNode>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(svg)?;
    let mut nodes = Vec::new();
    for element in doc.descendants() {
        if element.tag_name().name() != "g" {
            continue;
        }
        let Some(class) = element.attribute("class") else {
            continue;
        };
        if !class_is_node(class) {
            continue;
        }
        let translate = parse_translate(element.attribute("transform").unwrap_or(""));

        let mut offset = (0.0, 0.0);
        let mut size = None;
        for shape in element.descendants() {
            if shape.tag_name().name() == "rect" {
                let x = shape.attribute("x").and_then(to_float).unwrap_or(0.0);
                let y = shape.attribute("y").and_then(to_float).unwrap_or(0.0);
                let w = shape.attribute("width").and_then(to_float).unwrap_or(0.0);
                let h = shape.attribute("height").and_then(to_float).unwrap_or(0.0);
                offset = (x + w / 2.0, y + h / 2.0);
                size = Some((w, h));
                break;
            }
            if shape.tag_name().name() == "circle" {
                let cx = shape.attribute("cx").and_then(to_float).unwrap_or(0.0);
                let cy = shape.attribute("cy").and_then(to_float).unwrap_or(0.0);
                let r = shape.attribute("r").and_then(to_float).unwrap_or(0.0);
                offset = (cx, cy);
                size = Some((r * 2.0, r * 2.0));
                break;
            }
            if shape.tag_name().name() == "ellipse" {
                let cx = shape.attribute("cx").and_then(to_float).unwrap_or(0.0);
                let cy = shape.attribute("cy").and_then(to_float).unwrap_or(0.0);
                let rx = shape.attribute("rx").and_then(to_float).unwrap_or(0.0);
                let ry = shape.attribute("ry").and_then(to_float).unwrap_or(0.0);
                offset = (cx, cy);
                size = Some((rx * 2.0, ry * 2.0));
                break;
            }
        }

        let mut text = String::new();
        collect_text(element, &mut text);

        nodes.push(SvgNode {
            id: element.attribute("id").unwrap_or("").to_string(),
            label: clean_label(&text),
            center: (translate.0 + offset.0, translate.1 + offset.1),
            size,
        });
    }
    Ok(nodes)
}

/// Renders the Mermaid source to SVG and matches measured shapes back onto
/// draft nodes. Matching is label-first, falling back to id containment,
/// then to any still-unconsumed measured shape.
pub fn enrich_svg(draft: &mut GraphDraft, code: &str, renderer: &dyn Renderer) {
    if draft.nodes.is_empty() {
        return;
    }
    let svg = match renderer.render_svg(code) {
        Ok(svg) => svg,
        Err(err) => {
            draft.warn(skip_warning("svg_enrichment_skipped", &err));
            return;
        }
    };
    let measured = match extract_svg_nodes(&svg) {
        Ok(measured) => measured,
        Err(err) => {
            draft.warn(format!("svg_enrichment_skipped:unparsable_svg ({err})"));
            return;
        }
    };
    if measured.is_empty() {
        draft.warn("svg_enrichment_skipped:no_shapes_found".to_string());
        return;
    }

    // Label buckets: several nodes may render the same text.
    let mut buckets: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for (i, m) in measured.iter().enumerate() {
        buckets.entry(m.label.clone()).or_default().push(i);
    }
    let mut consumed = vec![false; measured.len()];

    for node in &mut draft.nodes {
        let wanted = node.label.as_deref().map(clean_label).unwrap_or_default();
        let pick = buckets
            .get(&wanted)
            .and_then(|bucket| take_first_free(bucket, &consumed))
            .or_else(|| {
                measured.iter().enumerate().position(|(i, m)| {
                    !consumed[i] && !m.id.is_empty() && m.id.contains(&node.id)
                })
            })
            .or_else(|| consumed.iter().position(|c| !c));
        let Some(index) = pick else {
            continue;
        };
        consumed[index] = true;
        let m = &measured[index];
        node.pos = Some(m.center);
        if let Some((w, h)) = m.size {
            node.width = Some(w);
            node.height = Some(h);
        }
    }

    // Rendered shapes nothing claimed (edge-label groups, decorations).
    let leftover = consumed.iter().filter(|c| !**c).count();
    if leftover > 0 {
        draft.warn(format!("svg_enrichment_unmatched:{leftover}"));
    }
}

fn take_first_free(bucket: &[usize], consumed: &[bool]) -> Option<usize> {
    bucket.iter().copied().find(|&i| !consumed[i])
}

fn skip_warning(prefix: &str, err: &RenderError) -> String {
    match err {
        RenderError::ToolMissing(tool) => format!("{prefix}:{tool}_not_found"),
        RenderError::Timeout(tool) => format!("{prefix}:{tool}_timeout"),
        RenderError::Failed { tool, .. } => format!("{prefix}:{tool}_failed"),
        RenderError::Unparsable { tool, .. } => format!("{prefix}:{tool}_unparsable"),
        RenderError::Io(_) => format!("{prefix}:io_error"),
    }
}