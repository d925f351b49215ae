//! RDF terms bound to the projection variable.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RdfTerm {
    Iri {
        value: String,
    },
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    BlankNode {
        value: String,
    },
}

impl RdfTerm {
    pub fn iri(value: &str) -> Self {
        RdfTerm::Iri {
            value: value.to_string(),
        }
    }

    /// Plain (`xsd:string`, no language) literal.
    pub fn literal(value: &str) -> Self {
        RdfTerm::Literal {
            value: value.to_string(),
            datatype: None,
            language: None,
        }
    }

    pub fn lang_literal(value: &str, language: &str) -> Self {
        RdfTerm::Literal {
            value: value.to_string(),
            datatype: None,
            language: Some(language.to_string()),
        }
    }

    pub fn typed_literal(value: &str, datatype: &str) -> Self {
        RdfTerm::Literal {
            value: value.to_string(),
            datatype: Some(datatype.to_string()),
            language: None,
        }
    }

    pub fn blank(value: &str) -> Self {
        RdfTerm::BlankNode {
            value: value.to_string(),
        }
    }

    /// Lexical value without any syntax decoration.
    pub fn value(&self) -> &str {
        match self {
            RdfTerm::Iri { value } | RdfTerm::BlankNode { value } => value,
            RdfTerm::Literal { value, .. } => value,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, RdfTerm::Iri { .. })
    }
}

/// N-Triples style rendering.
impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfTerm::Iri { value } => write!(f, "<{value}>"),
            RdfTerm::BlankNode { value } => write!(f, "_:{value}"),
            RdfTerm::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "{}", crate::ir::render_literal(value))?;
                if let Some(language) = language {
                    write!(f, "@{language}")
                } else if let Some(datatype) = datatype {
                    write!(f, "^^<{datatype}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}
