use std::sync::Arc;

use crate::{DisabledRenderer, IrDocument, ParseOptions, Pipeline};

mod dot;
mod normalize;
mod sequence;
mod tikz;

/// Pipeline wired to a renderer that behaves as if no tools are installed.
fn offline() -> Pipeline {
    Pipeline::with_renderer(Arc::new(DisabledRenderer))
}

fn structural() -> ParseOptions {
    ParseOptions {
        enrich_geometry: false,
    }
}

fn parse(code: &str) -> IrDocument {
    offline().parse(code, "test", &structural()).unwrap()
}
