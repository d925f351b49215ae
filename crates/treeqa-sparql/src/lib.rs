//! TreeQA SPARQL synthesis
//!
//! Turns the bottom-up path of an annotated question tree into candidate
//! SPARQL queries, and splits oversized `FILTER(?proj IN (...))` clauses into
//! bounded batches for execution.
//!
//! ```text
//!   QuestionTree ──► ParseTreePath ──► QueryPatternSynthesizer ──► CandidateSet
//!                                                                      │
//!                                     FilterBatcher ◄── (executor) ◄───┘
//! ```
//!
//! Queries are assembled as a small typed IR ([`ir::SelectQuery`]) and only
//! rendered to text at the boundary. Every candidate has exactly one free
//! projection variable, [`PROJECTION_VAR`].

pub mod batch;
pub mod candidate;
pub mod ir;
pub mod synth;
pub mod term;

/// Name of the single projection variable (`?proj`).
pub const PROJECTION_VAR: &str = "proj";

pub use batch::{has_in_filter, FilterBatchError, FilterBatcher, InList, DEFAULT_FILTER_BATCH_SIZE};
pub use candidate::{CandidateQuery, CandidateSet};
pub use ir::{InFilter, PatternTerm, SelectQuery, TriplePattern};
pub use synth::{QueryPatternSynthesizer, Rule, Synthesis, SynthesisError, SynthesisStep};
pub use term::RdfTerm;
