//! Sequential execution of candidate queries.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use treeqa_sparql::{
    has_in_filter, CandidateQuery, CandidateSet, FilterBatchError, FilterBatcher, RdfTerm,
    PROJECTION_VAR,
};

use crate::endpoint::SparqlEndpoint;

/// Answers per candidate, keyed by the candidate text as synthesized (before
/// any batching).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<CandidateQuery, BTreeSet<RdfTerm>>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `answers` into the set for `candidate`, creating it if needed.
    pub fn insert(&mut self, candidate: CandidateQuery, answers: impl IntoIterator<Item = RdfTerm>) {
        self.0.entry(candidate).or_default().extend(answers);
    }

    pub fn get(&self, candidate: &str) -> Option<&BTreeSet<RdfTerm>> {
        self.0.get(candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateQuery, &BTreeSet<RdfTerm>)> {
        self.0.iter()
    }

    /// Number of candidates, answered or not.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Candidates that produced at least one answer.
    pub fn non_empty(&self) -> impl Iterator<Item = (&CandidateQuery, &BTreeSet<RdfTerm>)> {
        self.0.iter().filter(|(_, answers)| !answers.is_empty())
    }

    pub fn into_inner(self) -> BTreeMap<CandidateQuery, BTreeSet<RdfTerm>> {
        self.0
    }
}

impl<'a> IntoIterator for &'a AnswerMap {
    type Item = (&'a CandidateQuery, &'a BTreeSet<RdfTerm>);
    type IntoIter = std::collections::btree_map::Iter<'a, CandidateQuery, BTreeSet<RdfTerm>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// What running one candidate did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub answers: BTreeSet<RdfTerm>,
    /// Batches sent to the endpoint.
    pub batches: usize,
    pub failed_batches: usize,
    /// Set when the candidate's IN-filter could not be split; nothing was sent.
    pub filter_error: Option<FilterBatchError>,
}

impl ExecutionOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed_batches == 0 && self.filter_error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct QueryExecutor<E> {
    endpoint: E,
    batcher: FilterBatcher,
    projection: String,
}

impl<E: SparqlEndpoint> QueryExecutor<E> {
    pub fn new(endpoint: E, batcher: FilterBatcher) -> Self {
        Self {
            endpoint,
            batcher,
            projection: PROJECTION_VAR.to_string(),
        }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn batcher(&self) -> &FilterBatcher {
        &self.batcher
    }

    /// Run every candidate, one at a time. Never fails: a candidate whose
    /// batches all fail maps to an empty set.
    pub fn execute(&self, candidates: &CandidateSet) -> AnswerMap {
        let mut answers = AnswerMap::new();
        for candidate in candidates {
            let outcome = self.execute_one(candidate);
            if !outcome.is_clean() {
                tracing::warn!(
                    query = %candidate,
                    batches = outcome.batches,
                    failed = outcome.failed_batches,
                    answers = outcome.answers.len(),
                    "candidate executed with errors"
                );
            }
            answers.insert(candidate.clone(), outcome.answers);
        }
        answers
    }

    pub fn execute_one(&self, candidate: &CandidateQuery) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::default();

        let batches = if has_in_filter(candidate.as_str()) {
            match self.batcher.split(candidate.as_str()) {
                Ok(batches) => batches,
                // `FILTER` appeared only as text (a literal, a non-IN filter).
                Err(FilterBatchError::MissingFilter) => vec![candidate.as_str().to_string()],
                Err(err) => {
                    tracing::error!(
                        query = %candidate,
                        error = %err,
                        "cannot split IN-filter; candidate not executed"
                    );
                    outcome.filter_error = Some(err);
                    return outcome;
                }
            }
        } else {
            vec![candidate.as_str().to_string()]
        };

        for batch in &batches {
            outcome.batches += 1;
            match self.endpoint.select(batch, &self.projection) {
                Ok(terms) => outcome.answers.extend(terms),
                Err(err) => {
                    outcome.failed_batches += 1;
                    tracing::error!(query = %batch, error = %err, "batch execution failed");
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_unions_answers() {
        let mut map = AnswerMap::new();
        let q = CandidateQuery::new("SELECT ?proj WHERE { ?proj ?p ?o . }");
        map.insert(q.clone(), [RdfTerm::literal("a")]);
        map.insert(q.clone(), [RdfTerm::literal("b"), RdfTerm::literal("a")]);
        map.insert(CandidateQuery::new("SELECT ?proj WHERE { }"), Vec::<RdfTerm>::new());

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(q.as_str()).map(|s| s.len()), Some(2));
        assert_eq!(map.non_empty().count(), 1);
    }

    #[test]
    fn serializes_as_object_of_term_lists() {
        let mut map = AnswerMap::new();
        map.insert(CandidateQuery::new("Q"), [RdfTerm::iri("http://x/a")]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["Q"][0]["value"], "http://x/a");
    }
}
