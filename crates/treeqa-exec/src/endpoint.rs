//! SPARQL protocol endpoints.
//!
//! [`SparqlEndpoint`] is the seam the executor talks to; [`HttpEndpoint`]
//! is the real implementation (SPARQL 1.1 protocol, GET, JSON results).
//! Tests substitute in-memory stubs.

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use treeqa_sparql::RdfTerm;
use url::Url;

use crate::config::{ConfigError, EndpointConfig};

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Largest response body excerpt kept in [`EndpointError::Http`].
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid SPARQL results document: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Something that can evaluate a SELECT query and hand back the values bound
/// to one variable, in result order.
pub trait SparqlEndpoint {
    fn select(&self, query: &str, var: &str) -> Result<Vec<RdfTerm>, EndpointError>;
}

impl<E: SparqlEndpoint + ?Sized> SparqlEndpoint for &E {
    fn select(&self, query: &str, var: &str) -> Result<Vec<RdfTerm>, EndpointError> {
        (**self).select(query, var)
    }
}

impl<E: SparqlEndpoint + ?Sized> SparqlEndpoint for Box<E> {
    fn select(&self, query: &str, var: &str) -> Result<Vec<RdfTerm>, EndpointError> {
        (**self).select(query, var)
    }
}

// ============================================================================
// HTTP
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: Client,
    url: Url,
    default_graph_uri: Option<String>,
    timeout: Duration,
}

impl HttpEndpoint {
    pub fn new(config: &EndpointConfig) -> Result<Self, EndpointError> {
        config.validate()?;
        let url = config.endpoint_url()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| EndpointError::Network {
                url: url.to_string(),
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            url,
            default_graph_uri: config.default_graph_uri.clone(),
            timeout: config.timeout(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.url.clone();
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("query", query);
            if let Some(graph) = &self.default_graph_uri {
                params.append_pair("default-graph-uri", graph);
            }
        }
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> EndpointError {
        if err.is_timeout() {
            EndpointError::Timeout {
                url: self.url.to_string(),
                timeout: self.timeout,
            }
        } else {
            EndpointError::Network {
                url: self.url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl SparqlEndpoint for HttpEndpoint {
    fn select(&self, query: &str, var: &str) -> Result<Vec<RdfTerm>, EndpointError> {
        tracing::debug!(endpoint = %self.url, bytes = query.len(), "sending SELECT");

        // `text()` consumes the response, so the connection goes back to the
        // pool on every path below.
        let resp = self
            .client
            .get(self.request_url(query))
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .send()
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(EndpointError::Http {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }
        parse_select_results(&body, var)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

// ============================================================================
// SPARQL 1.1 query results JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    results: Option<Bindings>,
}

#[derive(Debug, Deserialize)]
struct Bindings {
    bindings: Vec<HashMap<String, JsonTerm>>,
}

#[derive(Debug, Deserialize)]
struct JsonTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
    datatype: Option<String>,
}

impl JsonTerm {
    fn into_term(self) -> Result<RdfTerm, EndpointError> {
        match self.kind.as_str() {
            "uri" => Ok(RdfTerm::iri(&self.value)),
            "bnode" => Ok(RdfTerm::blank(&self.value)),
            // `typed-literal` is the pre-standard spelling some endpoints
            // (Virtuoso among them) still emit.
            "literal" | "typed-literal" => Ok(match (&self.lang, &self.datatype) {
                (Some(lang), _) => RdfTerm::lang_literal(&self.value, lang),
                (None, Some(datatype)) => RdfTerm::typed_literal(&self.value, datatype),
                (None, None) => RdfTerm::literal(&self.value),
            }),
            other => Err(EndpointError::InvalidResponse(format!(
                "unknown term type `{other}`"
            ))),
        }
    }
}

/// Values bound to `var` in a `application/sparql-results+json` document.
///
/// Rows that leave `var` unbound are skipped.
pub fn parse_select_results(body: &str, var: &str) -> Result<Vec<RdfTerm>, EndpointError> {
    let doc: ResultsDocument =
        serde_json::from_str(body).map_err(|e| EndpointError::InvalidResponse(e.to_string()))?;
    let results = doc
        .results
        .ok_or_else(|| EndpointError::InvalidResponse("missing `results` member".to_string()))?;

    results
        .bindings
        .into_iter()
        .filter_map(|mut row| row.remove(var))
        .map(JsonTerm::into_term)
        .collect()
}
