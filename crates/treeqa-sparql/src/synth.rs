//! Heuristic synthesis of candidate queries from a question tree.
//!
//! The synthesizer walks the bottom-up [`ParseTreePath`] and looks at each
//! `(bottom, top)` pair, where `top` is the parent of `bottom`:
//!
//! | position | bottom | top | candidates |
//! |---|---|---|---|
//! | top is root | `WRB`/`WP`/`NN*` | | `?proj a <C>` per annotation `C` |
//! | top is root | `CombinedNN` | | `?proj ?p ?o` restricted to all annotations |
//! | inner | `CombinedNN` | `VB*`/`NN*` | `?proj <P> ?o` and `?o <P> ?proj` per annotation `P` of top, restricted to bottom's annotations |
//! | inner | `ADD` | `VB*`/`NN*` | `?proj <A> "label"` per annotation `A` of top, plus `?proj ?p "label"` and `"label" ?p ?proj` restricted to top's annotations |
//!
//! Inner rules resolve `top` as well, so they consume two path positions.
//! Positions that fit no rule, or lack the annotations a rule needs, are
//! skipped with a diagnostic; synthesis itself never fails.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use treeqa_tree::tag::{is_combined_noun, is_question_word_or_noun, is_residual, is_verb_or_noun};
use treeqa_tree::{NodeId, ParseNode, ParseTreePath, QuestionTree};

use crate::candidate::{CandidateQuery, CandidateSet};
use crate::ir::{PatternTerm, SelectQuery};
use crate::PROJECTION_VAR;

/// The query template a path position was matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Question word or noun directly under the root.
    TypeRestriction,
    /// `CombinedNN` directly under the root.
    CombinedNounFilter,
    /// `CombinedNN` under a verb or noun predicate.
    PredicateFilter,
    /// `ADD` literal under a verb or noun predicate.
    ResidualLiteral,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rule::TypeRestriction => "type-restriction",
            Rule::CombinedNounFilter => "combined-noun-filter",
            Rule::PredicateFilter => "predicate-filter",
            Rule::ResidualLiteral => "residual-literal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("`{tag}` node `{label}` has no annotations; {rule} needs at least one")]
    AnnotationShortage {
        node: NodeId,
        tag: String,
        label: String,
        rule: Rule,
    },
    #[error("unsupported pattern: `{bottom_tag}` under `{top_tag}`")]
    UnsupportedPattern {
        node: NodeId,
        bottom_tag: String,
        top_tag: String,
        at_root: bool,
    },
}

/// What happened at one path position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisStep {
    pub position: usize,
    pub bottom: NodeId,
    pub top: NodeId,
    /// `None` when the position was skipped as unsupported.
    pub rule: Option<Rule>,
    /// Path positions consumed (1 or 2).
    pub consumed: usize,
    /// Candidate texts produced, before de-duplication.
    pub emitted: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    pub candidates: CandidateSet,
    pub diagnostics: Vec<SynthesisError>,
    pub steps: Vec<SynthesisStep>,
}

/// Result of matching one path position against the rule table.
struct Applied {
    rule: Option<Rule>,
    consumed: usize,
    queries: Vec<SelectQuery>,
    error: Option<SynthesisError>,
}

impl Applied {
    fn emitted(rule: Rule, consumed: usize, queries: Vec<SelectQuery>) -> Self {
        Self {
            rule: Some(rule),
            consumed,
            queries,
            error: None,
        }
    }

    fn skipped(rule: Option<Rule>, consumed: usize, error: SynthesisError) -> Self {
        Self {
            rule,
            consumed,
            queries: vec![],
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryPatternSynthesizer {
    projection: String,
}

impl Default for QueryPatternSynthesizer {
    fn default() -> Self {
        Self {
            projection: PROJECTION_VAR.to_string(),
        }
    }
}

impl QueryPatternSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn synthesize(&self, tree: &QuestionTree) -> Synthesis {
        let path = ParseTreePath::extract(tree);
        let mut out = Synthesis::default();
        if path.is_empty() {
            tracing::warn!(
                question = %tree.question(),
                "root has no children; no candidates can be synthesized"
            );
            return out;
        }

        let mut position = 0;
        while let Some(bottom) = path.get(position) {
            // The path never contains the root, so every entry has a parent.
            let Some(top_id) = bottom.parent else {
                break;
            };
            let top = &tree[top_id];

            let applied = if top.is_root() {
                self.apply_root_rule(bottom, top)
            } else {
                self.apply_pair_rule(bottom, top)
            };

            if let Some(err) = applied.error {
                tracing::error!(
                    question = %tree.question(),
                    position,
                    tag = %bottom.tag,
                    error = %err,
                    "skipped path position during query synthesis"
                );
                out.diagnostics.push(err);
            }

            let emitted = applied.queries.len();
            for query in applied.queries {
                out.candidates.insert(CandidateQuery::from(query));
            }
            out.steps.push(SynthesisStep {
                position,
                bottom: bottom.id,
                top: top.id,
                rule: applied.rule,
                consumed: applied.consumed,
                emitted,
            });
            position += applied.consumed;
        }

        tracing::debug!(
            question = %tree.question(),
            path_len = path.len(),
            candidates = out.candidates.len(),
            diagnostics = out.diagnostics.len(),
            "synthesized candidate queries"
        );
        out
    }

    fn proj(&self) -> PatternTerm {
        PatternTerm::var(&self.projection)
    }

    fn select(&self) -> SelectQuery {
        SelectQuery::new(&self.projection)
    }

    /// `top` is the root: only `bottom` constrains the projection.
    fn apply_root_rule(&self, bottom: &ParseNode, top: &ParseNode) -> Applied {
        let rule = if is_question_word_or_noun(&bottom.tag) {
            Rule::TypeRestriction
        } else if is_combined_noun(&bottom.tag) {
            Rule::CombinedNounFilter
        } else {
            return Applied::skipped(None, 1, unsupported(bottom, top));
        };

        if !bottom.has_annotations() {
            return Applied::skipped(Some(rule), 1, shortage(bottom, rule));
        }

        let queries = match rule {
            Rule::TypeRestriction => bottom
                .annotations
                .iter()
                .map(|class| {
                    self.select()
                        .pattern(self.proj(), PatternTerm::RdfType, PatternTerm::iri(class))
                })
                .collect(),
            _ => vec![self
                .select()
                .pattern(self.proj(), PatternTerm::var("p"), PatternTerm::var("o"))
                .restrict_to(&bottom.annotations)],
        };
        Applied::emitted(rule, 1, queries)
    }

    /// `top` is an inner node: the pair is resolved together.
    fn apply_pair_rule(&self, bottom: &ParseNode, top: &ParseNode) -> Applied {
        if is_combined_noun(&bottom.tag) && is_verb_or_noun(&top.tag) {
            let rule = Rule::PredicateFilter;
            if !bottom.has_annotations() {
                return Applied::skipped(Some(rule), 2, shortage(bottom, rule));
            }
            if !top.has_annotations() {
                return Applied::skipped(Some(rule), 2, shortage(top, rule));
            }

            let mut queries = Vec::with_capacity(top.annotations.len() * 2);
            for predicate in &top.annotations {
                queries.push(
                    self.select()
                        .pattern(self.proj(), PatternTerm::iri(predicate), PatternTerm::var("o"))
                        .restrict_to(&bottom.annotations),
                );
                queries.push(
                    self.select()
                        .pattern(PatternTerm::var("o"), PatternTerm::iri(predicate), self.proj())
                        .restrict_to(&bottom.annotations),
                );
            }
            return Applied::emitted(rule, 2, queries);
        }

        if is_residual(&bottom.tag) && is_verb_or_noun(&top.tag) {
            let label = PatternTerm::literal(&bottom.label);
            let mut queries: Vec<SelectQuery> = top
                .annotations
                .iter()
                .map(|predicate| {
                    self.select()
                        .pattern(self.proj(), PatternTerm::iri(predicate), label.clone())
                })
                .collect();

            // Full-text style lookups in both directions, with any predicate.
            queries.push(
                self.select()
                    .pattern(self.proj(), PatternTerm::var("p"), label.clone())
                    .restrict_to(&top.annotations),
            );
            queries.push(
                self.select()
                    .pattern(label, PatternTerm::var("p"), self.proj())
                    .restrict_to(&top.annotations),
            );
            return Applied::emitted(Rule::ResidualLiteral, 2, queries);
        }

        Applied::skipped(None, 1, unsupported(bottom, top))
    }
}

fn shortage(node: &ParseNode, rule: Rule) -> SynthesisError {
    SynthesisError::AnnotationShortage {
        node: node.id,
        tag: node.tag.clone(),
        label: node.label.clone(),
        rule,
    }
}

fn unsupported(bottom: &ParseNode, top: &ParseNode) -> SynthesisError {
    SynthesisError::UnsupportedPattern {
        node: bottom.id,
        bottom_tag: bottom.tag.clone(),
        top_tag: top.tag.clone(),
        at_root: top.is_root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeqa_tree::NodeSpec;

    fn tree_of(chain: NodeSpec) -> QuestionTree {
        QuestionTree::from_spec("test question", &NodeSpec::new("ROOT", "").with_child(chain))
    }

    fn texts(synthesis: &Synthesis) -> Vec<&str> {
        synthesis.candidates.iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn question_word_at_root_yields_one_type_restriction_per_annotation() {
        let tree = tree_of(NodeSpec::new("WP", "Who").with_annotations(["http://x/A", "http://x/B"]));
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        assert_eq!(
            texts(&out),
            vec![
                "SELECT ?proj WHERE {\n  ?proj a <http://x/A> .\n}",
                "SELECT ?proj WHERE {\n  ?proj a <http://x/B> .\n}",
            ]
        );
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.steps[0].rule, Some(Rule::TypeRestriction));
    }

    #[test]
    fn combined_noun_at_root_yields_single_filtered_candidate() {
        let tree = tree_of(
            NodeSpec::new("CombinedNN", "rivers")
                .with_annotations(["http://x/A", "http://x/B", "http://x/C"]),
        );
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        assert_eq!(
            texts(&out),
            vec!["SELECT ?proj WHERE {\n  ?proj ?p ?o .\n  FILTER(?proj IN (<http://x/A>, <http://x/B>, <http://x/C>))\n}"]
        );
    }

    #[test]
    fn combined_noun_under_noun_consumes_two_positions() {
        let tree = tree_of(
            NodeSpec::new("NN", "capital").with_annotations(["http://x/P"]).with_child(
                NodeSpec::new("CombinedNN", "cities").with_annotations(["http://x/X", "http://x/Y"]),
            ),
        );
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        assert_eq!(
            texts(&out),
            vec![
                "SELECT ?proj WHERE {\n  ?o <http://x/P> ?proj .\n  FILTER(?proj IN (<http://x/X>, <http://x/Y>))\n}",
                "SELECT ?proj WHERE {\n  ?proj <http://x/P> ?o .\n  FILTER(?proj IN (<http://x/X>, <http://x/Y>))\n}",
            ]
        );
        assert_eq!(out.steps.len(), 1);
        assert_eq!(out.steps[0].consumed, 2);
        assert_eq!(out.steps[0].rule, Some(Rule::PredicateFilter));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn residual_literal_under_verb_then_question_word() {
        let tree = tree_of(
            NodeSpec::new("WP", "Who").with_annotations(["http://x/Person"]).with_child(
                NodeSpec::new("VBN", "born")
                    .with_annotations(["http://x/birthPlace", "http://x/deathPlace"])
                    .with_child(NodeSpec::new("ADD", "Ulm")),
            ),
        );
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        let filter = "  FILTER(?proj IN (<http://x/birthPlace>, <http://x/deathPlace>))\n";
        let mut expected = vec![
            "SELECT ?proj WHERE {\n  ?proj <http://x/birthPlace> \"Ulm\" .\n}".to_string(),
            "SELECT ?proj WHERE {\n  ?proj <http://x/deathPlace> \"Ulm\" .\n}".to_string(),
            format!("SELECT ?proj WHERE {{\n  ?proj ?p \"Ulm\" .\n{filter}}}"),
            format!("SELECT ?proj WHERE {{\n  \"Ulm\" ?p ?proj .\n{filter}}}"),
            "SELECT ?proj WHERE {\n  ?proj a <http://x/Person> .\n}".to_string(),
        ];
        expected.sort();
        assert_eq!(texts(&out), expected);

        let consumed: Vec<usize> = out.steps.iter().map(|s| s.consumed).collect();
        assert_eq!(consumed, vec![2, 1]);
    }

    #[test]
    fn residual_literal_without_predicates_keeps_generic_candidates() {
        let tree = tree_of(NodeSpec::new("VBD", "said").with_child(NodeSpec::new("ADD", "hello")));
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        assert_eq!(
            texts(&out),
            vec![
                "SELECT ?proj WHERE {\n  \"hello\" ?p ?proj .\n  FILTER(?proj IN ())\n}",
                "SELECT ?proj WHERE {\n  ?proj ?p \"hello\" .\n  FILTER(?proj IN ())\n}",
            ]
        );
    }

    #[test]
    fn unsupported_tag_at_root_is_skipped_with_diagnostic() {
        let tree = tree_of(NodeSpec::new("JJ", "tall").with_annotations(["http://x/A"]));
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        assert!(out.candidates.is_empty());
        assert!(matches!(
            out.diagnostics.as_slice(),
            [SynthesisError::UnsupportedPattern { bottom_tag, at_root: true, .. }] if bottom_tag == "JJ"
        ));
        assert_eq!(out.steps[0].rule, None);
    }

    #[test]
    fn unsupported_inner_pair_advances_one_position() {
        let tree = tree_of(
            NodeSpec::new("NN", "city")
                .with_annotations(["http://x/City"])
                .with_child(NodeSpec::new("JJ", "largest")),
        );
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        assert_eq!(texts(&out), vec!["SELECT ?proj WHERE {\n  ?proj a <http://x/City> .\n}"]);
        assert_eq!(out.steps.iter().map(|s| s.consumed).collect::<Vec<_>>(), vec![1, 1]);
        assert!(matches!(
            out.diagnostics.as_slice(),
            [SynthesisError::UnsupportedPattern { at_root: false, .. }]
        ));
    }

    #[test]
    fn missing_annotations_are_reported_not_fatal() {
        let tree = tree_of(NodeSpec::new("WRB", "Where"));
        let out = QueryPatternSynthesizer::new().synthesize(&tree);
        assert!(out.candidates.is_empty());
        assert!(matches!(
            out.diagnostics.as_slice(),
            [SynthesisError::AnnotationShortage { rule: Rule::TypeRestriction, .. }]
        ));

        let tree = tree_of(NodeSpec::new("CombinedNN", "things"));
        let out = QueryPatternSynthesizer::new().synthesize(&tree);
        assert!(out.candidates.is_empty());
        assert_eq!(out.diagnostics.len(), 1);

        let tree = tree_of(
            NodeSpec::new("VBZ", "flows")
                .with_annotations(["http://x/P"])
                .with_child(NodeSpec::new("CombinedNN", "rivers")),
        );
        let out = QueryPatternSynthesizer::new().synthesize(&tree);
        assert!(out.candidates.is_empty());
        assert_eq!(out.steps[0].consumed, 2);
        assert!(matches!(
            out.diagnostics.as_slice(),
            [SynthesisError::AnnotationShortage { rule: Rule::PredicateFilter, .. }]
        ));
    }

    #[test]
    fn identical_candidates_from_different_positions_collapse() {
        let pair = |child: NodeSpec| {
            NodeSpec::new("VBZ", "flows").with_annotations(["http://x/P"]).with_child(
                NodeSpec::new("CombinedNN", "rivers")
                    .with_annotations(["http://x/X"])
                    .with_child(child),
            )
        };
        let inner = NodeSpec::new("VBZ", "flows")
            .with_annotations(["http://x/P"])
            .with_child(NodeSpec::new("CombinedNN", "rivers").with_annotations(["http://x/X"]));
        let tree = tree_of(pair(inner));
        let out = QueryPatternSynthesizer::new().synthesize(&tree);

        assert_eq!(out.steps.len(), 2);
        assert_eq!(out.steps.iter().map(|s| s.emitted).sum::<usize>(), 4);
        assert_eq!(out.candidates.len(), 2);
    }

    #[test]
    fn childless_root_yields_nothing() {
        let tree = QuestionTree::new("empty", "ROOT", "");
        let out = QueryPatternSynthesizer::new().synthesize(&tree);
        assert!(out.candidates.is_empty());
        assert!(out.steps.is_empty());
        assert!(out.diagnostics.is_empty());
    }
}
