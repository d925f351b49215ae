//! Candidate query texts.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use crate::ir::SelectQuery;

/// Rendered text of one candidate query.
///
/// Identity is exact textual equality; two rules producing the same text
/// collapse to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateQuery(String);

/// De-duplicated candidates, iterated in text order.
pub type CandidateSet = BTreeSet<CandidateQuery>;

impl CandidateQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&SelectQuery> for CandidateQuery {
    fn from(query: &SelectQuery) -> Self {
        Self(query.render())
    }
}

impl From<SelectQuery> for CandidateQuery {
    fn from(query: SelectQuery) -> Self {
        Self(query.render())
    }
}

impl AsRef<str> for CandidateQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CandidateQuery {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
