//! TreeQA execution
//!
//! Runs synthesized candidate queries against a SPARQL endpoint and collects
//! the values bound to the projection variable, one answer set per candidate.
//!
//! Execution is strictly sequential: candidates one after another, and for
//! each candidate its filter batches one after another. A failing batch is
//! logged and contributes no answers; it never aborts sibling batches or
//! other candidates.

pub mod config;
pub mod endpoint;
pub mod executor;
pub mod pipeline;

pub use config::{ConfigError, EndpointConfig};
pub use endpoint::{parse_select_results, EndpointError, HttpEndpoint, SparqlEndpoint};
pub use executor::{AnswerMap, ExecutionOutcome, QueryExecutor};
pub use pipeline::QuestionAnswerer;
