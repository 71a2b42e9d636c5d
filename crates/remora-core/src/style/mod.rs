//! Style-cascade resolution.
//!
//! Every dialect hands each entity zero or more declaration layers, ordered
//! lowest-to-highest precedence (dialect default < class-derived < inline).
//! [`resolve`] merges them key-by-key (last layer wins) and interprets the
//! recognized CSS-like keys into concrete visual attributes. Unrecognized
//! keys survive as pass-through overrides on the entity.

use indexmap::IndexMap;

use crate::utils::{parse_dash_pattern, parse_numeric};

/// Ephemeral per-entity declaration bag; consumed by the resolver and never
/// present in the final IR.
pub type Declarations = IndexMap<String, String>;

/// What kind of entity a layer stack applies to. Edges interpret `color` as
/// stroke color; nodes interpret it as text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTarget {
    Node,
    Edge,
}

/// Concrete attributes produced by cascade resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStyle {
    pub stroke: Option<String>,
    pub fill: Option<String>,
    pub stroke_width: Option<f64>,
    pub text_color: Option<String>,
    pub dash: Option<Vec<f64>>,
    /// Style keywords promoted from declarations ("bold", "dashed").
    pub tokens: Vec<String>,
    /// Declarations nobody recognized; retained, never dropped silently.
    pub passthrough: Declarations,
}

impl ResolvedStyle {
    pub fn is_empty(&self) -> bool {
        self.stroke.is_none()
            && self.fill.is_none()
            && self.stroke_width.is_none()
            && self.text_color.is_none()
            && self.dash.is_none()
            && self.tokens.is_empty()
            && self.passthrough.is_empty()
    }
}

/// `Stroke_Width` / `stroke_width` / ` STROKE-WIDTH ` all normalize to `stroke-width`.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('_', "-")
}

/// Parses a raw declaration clause (`fill:#f00,stroke-width:2px;bold`) into a bag.
///
/// Entries split on `;` and `,`; each entry is `key:value`, `key=value`, or a
/// bare flag (stored with value `"true"`).
pub fn parse_declarations(text: &str) -> Declarations {
    let mut declarations = Declarations::new();
    for raw in text.split([';', ',']) {
        let entry = raw.trim();
        if entry.is_empty() {
            continue;
        }
        if let Some((key, value)) = entry.split_once(':').or_else(|| entry.split_once('=')) {
            declarations.insert(key.trim().to_string(), value.trim().to_string());
        } else {
            declarations.insert(entry.to_string(), "true".to_string());
        }
    }
    declarations
}

fn push_token(tokens: &mut Vec<String>, token: &str) {
    if !tokens.iter().any(|t| t == token) {
        tokens.push(token.to_string());
    }
}

/// Merges layers lowest-to-highest precedence then interprets recognized keys.
///
/// Resolution is idempotent: the same layer stack always yields the same
/// output, and a higher layer overrides a lower one key-for-key.
pub fn resolve(layers: &[&Declarations], target: StyleTarget) -> ResolvedStyle {
    let mut merged = Declarations::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(normalize_key(key), value.trim().to_string());
        }
    }

    let mut out = ResolvedStyle::default();
    for (key, value) in merged.iter() {
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "stroke" | "stroke-color" | "border" | "border-color" | "draw" | "line-color" => {
                out.stroke = Some(value.clone());
            }
            "fill" | "fill-color" | "background" | "background-color" => {
                out.fill = Some(value.clone());
            }
            "stroke-width" | "penwidth" => {
                if let Some(width) = parse_numeric(value) {
                    out.stroke_width = Some(width);
                    if width >= 2.0 {
                        push_token(&mut out.tokens, "bold");
                    }
                }
            }
            "stroke-dasharray" | "stroke-dashpattern" | "stroke-style" => {
                if let Some(dash) = parse_dash_pattern(value) {
                    // "0", "none" and "0,0" style values mean "solid".
                    if dash.iter().any(|v| *v != 0.0) {
                        out.dash = Some(dash);
                        push_token(&mut out.tokens, "dashed");
                    }
                } else {
                    let word = value.to_ascii_lowercase();
                    if word.contains("dash") || word.contains("dot") {
                        push_token(&mut out.tokens, "dashed");
                    }
                }
            }
            "font-weight" => {
                if matches!(
                    value.to_ascii_lowercase().as_str(),
                    "bold" | "600" | "700" | "800" | "900"
                ) {
                    push_token(&mut out.tokens, "bold");
                }
            }
            "color" => match target {
                StyleTarget::Node => out.text_color = Some(value.clone()),
                StyleTarget::Edge => out.stroke = Some(value.clone()),
            },
            _ => {
                out.passthrough.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls(text: &str) -> Declarations {
        parse_declarations(text)
    }

    #[test]
    fn last_layer_wins_key_by_key() {
        let base = decls("fill:#fff,stroke:#000");
        let class = decls("fill:#f00");
        let inline = decls("stroke:#00f");
        let resolved = resolve(&[&base, &class, &inline], StyleTarget::Node);
        assert_eq!(resolved.fill.as_deref(), Some("#f00"));
        assert_eq!(resolved.stroke.as_deref(), Some("#00f"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let base = decls("fill:#fff");
        let class = decls("stroke-width:3");
        let inline = decls("color:red,custom-key:7");
        let a = resolve(&[&base, &class, &inline], StyleTarget::Node);
        let b = resolve(&[&base, &class, &inline], StyleTarget::Node);
        assert_eq!(a, b);
        assert_eq!(a.stroke_width, Some(3.0));
        assert_eq!(a.tokens, vec!["bold".to_string()]);
        assert_eq!(a.passthrough.get("custom-key").map(String::as_str), Some("7"));
    }

    #[test]
    fn color_targets_differ_between_nodes_and_edges() {
        let layer = decls("color:#123456");
        let node = resolve(&[&layer], StyleTarget::Node);
        let edge = resolve(&[&layer], StyleTarget::Edge);
        assert_eq!(node.text_color.as_deref(), Some("#123456"));
        assert!(node.stroke.is_none());
        assert_eq!(edge.stroke.as_deref(), Some("#123456"));
    }

    #[test]
    fn dasharray_values_promote_dashed_token() {
        let layer = decls("stroke-dasharray:5 3");
        let resolved = resolve(&[&layer], StyleTarget::Edge);
        assert_eq!(resolved.dash, Some(vec![5.0, 3.0]));
        assert_eq!(resolved.tokens, vec!["dashed".to_string()]);
    }
}
