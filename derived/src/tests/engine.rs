use crate::engine::Engine;
use crate::semantic::SentenceRecord;
use crate::{DeriveError, ResourceLimits};
use serde_json::json;

#[test]
fn test_add_records_validates_up_front() {
    let mut engine = Engine::new();
    let error = engine
        .add_records(vec![SentenceRecord::new("x", "source", "frobnicate").object(1)])
        .unwrap_err();
    assert!(matches!(error, DeriveError::UnknownVerb { .. }));
    assert!(engine.sentences().is_empty());
}

#[test]
fn test_bad_path_expressions_are_rejected() {
    let result = Engine::from_records(vec![SentenceRecord::new("x", "source", "parse").object("$.[")]);
    assert!(matches!(result, Err(DeriveError::InvalidDefinition { ref sentence, .. }) if sentence == "x"));

    let result =
        Engine::from_records(vec![SentenceRecord::new("x", "source", "parse_jsonata").object("$sum(")]);
    assert!(matches!(result, Err(DeriveError::InvalidDefinition { .. })));
}

#[test]
fn test_binary_verbs_without_object_are_rejected() {
    let result = Engine::from_records(vec![
        SentenceRecord::new("_n", "source", "parse").object("$.n"),
        SentenceRecord::new("big", "_n", ">"),
    ]);
    assert!(matches!(result, Err(DeriveError::InvalidDefinition { ref sentence, .. }) if sentence == "big"));
}

#[test]
fn test_static_cycles_are_rejected() {
    let result = Engine::from_records(vec![
        SentenceRecord::new("a", "b", "and").object("c"),
        SentenceRecord::new("b", "c", "and").object(true),
        SentenceRecord::new("c", "a", "and").object(true),
    ]);
    match result {
        Err(DeriveError::CyclicDependency { cycle, .. }) => {
            assert_eq!(cycle, vec!["a", "b", "c", "a"]);
        }
        Err(other) => panic!("expected a cycle, got {other}"),
        Ok(_) => panic!("expected a cycle"),
    }
}

#[test]
fn test_later_batches_can_reference_earlier_ones() {
    let mut engine = Engine::new();
    engine
        .add_records(vec![SentenceRecord::new("_n", "source", "parse").object("$.n")])
        .unwrap();
    engine
        .add_records(vec![SentenceRecord::new("positive", "_n", ">").object(0)])
        .unwrap();
    let derived = engine.derive(&json!({"n": 3})).unwrap();
    assert_eq!(derived.get("positive"), Some(&json!(true)));
    assert_eq!(engine.evaluation_order().unwrap(), vec!["_n", "positive"]);
}

#[test]
fn test_sentence_count_limit() {
    let limits = ResourceLimits {
        max_sentences: 2,
        ..ResourceLimits::default()
    };
    let mut engine = Engine::with_limits(limits);
    let records = (0..3)
        .map(|i| SentenceRecord::new(format!("a{}", i), "source", "parse").object("$.a"))
        .collect();
    assert!(matches!(
        engine.add_records(records),
        Err(DeriveError::ResourceLimitExceeded { .. })
    ));
}

#[test]
fn test_expression_length_limit() {
    let limits = ResourceLimits {
        max_expression_bytes: 8,
        ..ResourceLimits::default()
    };
    let mut engine = Engine::with_limits(limits);
    let result = engine.add_records(vec![SentenceRecord::new("a", "source", "parse").object("$.abcdefghij")]);
    assert!(matches!(result, Err(DeriveError::ResourceLimitExceeded { ref limit_name, .. }) if limit_name == "max_expression_bytes"));
}

#[test]
fn test_empty_engine_derives_nothing() {
    let engine = Engine::new();
    assert!(engine.derive(&json!({"a": 1})).unwrap().is_empty());
}
