#![forbid(unsafe_code)]

//! `remora` normalizes three diagram notations into one canonical graph
//! IR: Mermaid-style text (flowchart, sequence diagram, mindmap), TikZ
//! pictures, and Python graphviz-builder programs.
//!
//! This crate is a thin facade over `remora-core`:
//!
//! ```no_run
//! use remora::{Pipeline, ParseOptions};
//!
//! let doc = Pipeline::new().parse(
//!     "flowchart LR\n  a --> b",
//!     "demo",
//!     &ParseOptions::default(),
//! )?;
//! println!("{}", serde_json::to_string_pretty(&doc).unwrap());
//! # Ok::<(), remora::Error>(())
//! ```

pub use remora_core::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_reexports_the_pipeline() {
        let doc = Pipeline::new()
            .parse_as(
                Dialect::Flowchart,
                "flowchart LR\nA-->B",
                "facade",
                &ParseOptions {
                    enrich_geometry: false,
                },
            )
            .unwrap();
        assert_eq!(doc.title, "facade");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["nodes"][0]["id"], "A");
    }
}
