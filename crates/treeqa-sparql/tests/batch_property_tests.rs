//! Property tests for IN-filter batching.
//!
//! Batching must be lossless: the batch value lists, concatenated in
//! emission order, are exactly the original list.

use proptest::prelude::*;
use treeqa_sparql::{FilterBatcher, PatternTerm, SelectQuery, PROJECTION_VAR};

fn candidate_with(values: &[String]) -> String {
    SelectQuery::new(PROJECTION_VAR)
        .pattern(PatternTerm::var(PROJECTION_VAR), PatternTerm::var("p"), PatternTerm::var("o"))
        .restrict_to(values)
        .render()
}

fn iri_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "http://dbpedia\\.org/resource/[A-Za-z_]{1,12}",
        "http://example\\.org/[a-z]{1,4},[0-9]{1,3}",
        "http://example\\.org/\\([0-9]{1,3}\\)",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn batches_concatenate_to_original(
        values in prop::collection::vec(iri_strategy(), 0..260),
        batch_size in 1usize..80,
    ) {
        let query = candidate_with(&values);
        let batcher = FilterBatcher::new(batch_size).unwrap();
        let batches = batcher.split(&query).unwrap();

        let expected_batches = values.len().div_ceil(batch_size).max(1);
        prop_assert_eq!(batches.len(), expected_batches);

        let original = batcher.extract(&query).unwrap();
        let mut rejoined = Vec::new();
        for batch in &batches {
            let list = batcher.extract(batch).unwrap();
            prop_assert!(list.len() <= batch_size);
            rejoined.extend(list.values().iter().map(|v| v.to_string()));
        }
        let original: Vec<String> = original.values().iter().map(|v| v.to_string()).collect();
        prop_assert_eq!(rejoined, original);
    }

    #[test]
    fn batches_share_everything_but_the_list(
        values in prop::collection::vec(iri_strategy(), 51..200),
    ) {
        let query = candidate_with(&values);
        let batcher = FilterBatcher::default();
        let batches = batcher.split(&query).unwrap();

        for batch in &batches {
            prop_assert!(
                batch.starts_with("SELECT ?proj WHERE {\n  ?proj ?p ?o .\n  FILTER(?proj IN (<"),
                "unexpected batch prefix: {}",
                batch
            );
            prop_assert!(batch.ends_with(">))\n}"), "unexpected batch suffix: {}", batch);
        }
    }

    #[test]
    fn small_lists_are_left_alone(values in prop::collection::vec(iri_strategy(), 0..=50)) {
        let query = candidate_with(&values);
        let batches = FilterBatcher::default().split(&query).unwrap();
        prop_assert_eq!(batches, vec![query]);
    }
}

#[test]
fn distinct_values_never_repeat_across_batches() {
    let values: Vec<String> = (0..137).map(|i| format!("http://example.org/r{i}")).collect();
    let query = candidate_with(&values);
    let batcher = FilterBatcher::default();
    let batches = batcher.split(&query).unwrap();
    assert_eq!(batches.len(), 3);

    let mut seen = std::collections::HashSet::new();
    for batch in &batches {
        for value in batcher.extract(batch).unwrap().values() {
            assert!(seen.insert(value.to_string()), "duplicate {value}");
        }
    }
    assert_eq!(seen.len(), 137);
}
