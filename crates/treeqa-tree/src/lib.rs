//! TreeQA parse trees
//!
//! This crate models the annotated syntactic parse tree of a natural-language
//! question, as produced by the (external) parsing and entity-linking
//! pipeline, and provides the read-only views the query synthesizer needs.
//!
//! - [`tree`]: the node arena (`QuestionTree`, `ParseNode`, `NodeId`).
//! - [`tag`]: the part-of-speech tag vocabulary and its classes.
//! - [`path`]: the bottom-up first-child path (`ParseTreePath`).
//! - [`bracketed`] / [`json`]: the two textual input formats.
//!
//! Nodes are stored in a flat arena and refer to each other by index, so the
//! parent back-reference never forms an ownership cycle.

pub mod bracketed;
pub mod json;
pub mod path;
pub mod tag;
pub mod tree;

pub use bracketed::{parse_bracketed_document, parse_bracketed_tree, TreeParseError};
pub use json::{parse_json_document, TreeDocument};
pub use path::ParseTreePath;
pub use tag::TagClass;
pub use tree::{NodeId, NodeSpec, ParseNode, QuestionTree, TreeError};
