//! Question in, answers out.

use treeqa_sparql::{FilterBatcher, QueryPatternSynthesizer, Synthesis};
use treeqa_tree::QuestionTree;

use crate::config::{ConfigError, EndpointConfig};
use crate::endpoint::{EndpointError, HttpEndpoint, SparqlEndpoint};
use crate::executor::{AnswerMap, QueryExecutor};

/// Synthesis followed by execution. Holds no per-question state, so one
/// instance can answer any number of questions.
#[derive(Debug, Clone)]
pub struct QuestionAnswerer<E> {
    synthesizer: QueryPatternSynthesizer,
    executor: QueryExecutor<E>,
}

impl QuestionAnswerer<HttpEndpoint> {
    /// HTTP endpoint and batch size taken from `config`.
    pub fn from_config(config: &EndpointConfig) -> Result<Self, EndpointError> {
        let endpoint = HttpEndpoint::new(config)?;
        let batcher = FilterBatcher::new(config.batch_size)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self::new(QueryExecutor::new(endpoint, batcher)))
    }
}

impl<E: SparqlEndpoint> QuestionAnswerer<E> {
    pub fn new(executor: QueryExecutor<E>) -> Self {
        Self {
            synthesizer: QueryPatternSynthesizer::new(),
            executor,
        }
    }

    pub fn executor(&self) -> &QueryExecutor<E> {
        &self.executor
    }

    pub fn answer(&self, tree: &QuestionTree) -> AnswerMap {
        self.answer_with_report(tree).1
    }

    /// Like [`answer`](Self::answer), also returning the synthesis report.
    pub fn answer_with_report(&self, tree: &QuestionTree) -> (Synthesis, AnswerMap) {
        let synthesis = self.synthesizer.synthesize(tree);
        let answers = self.executor.execute(&synthesis.candidates);
        tracing::info!(
            question = %tree.question(),
            candidates = answers.len(),
            answered = answers.non_empty().count(),
            "answered question"
        );
        (synthesis, answers)
    }
}
