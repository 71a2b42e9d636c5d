//! remora-core: diagram sources in, canonical graph IR out.
//!
//! Three families of diagram notation are accepted: Mermaid-style text
//! (flowchart, sequence diagram, mindmap), TikZ pictures, and Python
//! graphviz-builder programs. Each is detected, structurally parsed, run
//! through a shared style cascade, optionally enriched with renderer-measured
//! geometry, and emitted as one [`ir::IrDocument`].
//!
//! ```no_run
//! use remora_core::{Pipeline, ParseOptions};
//!
//! let pipeline = Pipeline::new();
//! let doc = pipeline.parse("flowchart LR\n  a --> b", "demo", &ParseOptions::default())?;
//! assert_eq!(doc.dialect, "flowchart");
//! # Ok::<(), remora_core::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod detect;
pub mod dialects;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod normalize;
pub mod render;
pub mod style;
pub mod utils;

use std::sync::Arc;

pub use detect::{Dialect, DetectorRegistry};
pub use error::{Error, Result};
pub use ir::IrDocument;
pub use render::{DisabledRenderer, Renderer, SystemRenderer};

/// Per-call knobs.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Invoke external renderers (pdflatex / python3+dot / mmdc) to measure
    /// node geometry. Failures degrade to warnings either way.
    pub enrich_geometry: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            enrich_geometry: true,
        }
    }
}

/// The full source-to-IR pipeline. Cheap to construct; renderer and
/// detector registry are shared behind the instance.
pub struct Pipeline {
    registry: DetectorRegistry,
    renderer: Arc<dyn Renderer>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Pipeline with the default detectors and system subprocess renderers.
    pub fn new() -> Self {
        Self {
            registry: DetectorRegistry::default_dialects(),
            renderer: Arc::new(SystemRenderer::default()),
        }
    }

    /// Substitutes the renderer; used to stub out subprocesses.
    pub fn with_renderer(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            registry: DetectorRegistry::default_dialects(),
            renderer,
        }
    }

    /// Detects the dialect, then parses.
    pub fn parse(&self, code: &str, source_id: &str, options: &ParseOptions) -> Result<IrDocument> {
        if code.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let dialect = self.registry.detect(code)?;
        tracing::debug!(dialect = %dialect, source_id, "dialect detected");
        self.parse_as(dialect, code, source_id, options)
    }

    /// Parses with a caller-chosen dialect, skipping detection.
    pub fn parse_as(
        &self,
        dialect: Dialect,
        code: &str,
        source_id: &str,
        options: &ParseOptions,
    ) -> Result<IrDocument> {
        if code.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut draft = dialects::parse(
            dialect,
            code,
            source_id,
            self.renderer.as_ref(),
            options.enrich_geometry,
        );

        if options.enrich_geometry {
            match dialect {
                Dialect::Tikz => geometry::enrich_tikz(&mut draft, code, self.renderer.as_ref()),
                Dialect::Flowchart | Dialect::Sequence | Dialect::Mindmap => {
                    geometry::enrich_svg(&mut draft, code, self.renderer.as_ref());
                }
                // The graphviz path measures during parsing (dot -Tjson).
                Dialect::Dot => {}
            }
        }

        let doc = normalize::finalize(draft);
        tracing::debug!(
            dialect = %dialect,
            nodes = doc.nodes.len(),
            edges = doc.edges.len(),
            warnings = doc.warnings.len(),
            "normalized"
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests;
