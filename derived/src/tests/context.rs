use crate::evaluator::context::{EvaluationContext, Status};
use crate::evaluator::Evaluator;
use crate::query::{JsonPath, QueryAdapter, QueryBackend, QueryError, QueryLanguage};
use crate::semantic::{Reference, Sentence, SentenceSet};
use crate::{DeriveError, ResourceLimits};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Delegates to JSONPath and counts evaluations
struct CountingBackend(Arc<AtomicUsize>);

impl QueryBackend for CountingBackend {
    fn check(&self, expression: &str) -> Result<(), QueryError> {
        JsonPath.check(expression)
    }

    fn evaluate_list(&self, expression: &str, document: &Value) -> Result<Vec<Value>, QueryError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        JsonPath.evaluate_list(expression, document)
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn parse(name: &str, path: &str) -> Sentence {
    Sentence::new(name, Reference::Source, "parse").with_object(Reference::literal(path))
}

fn gt(name: &str, subject: &str, object: i64) -> Sentence {
    Sentence::new(name, Reference::attribute(subject), ">").with_object(Reference::literal(object))
}

#[test]
fn test_shared_dependencies_are_evaluated_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let queries =
        QueryAdapter::new().with_backend(QueryLanguage::JsonPath, Box::new(CountingBackend(calls.clone())));
    let limits = ResourceLimits::default();
    let set = SentenceSet::new(vec![
        gt("big", "_n", 10),
        gt("huge", "_n", 100),
        parse("_n", "$.n"),
        Sentence::new("both", Reference::attribute("big"), "and")
            .with_object(Reference::attribute("huge")),
    ])
    .unwrap();
    let doc = json!({"n": 50});

    let mut context = EvaluationContext::new(&set, &doc);
    let derived = Evaluator::new(&queries, &limits, today())
        .evaluate(&mut context)
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(context.evaluations(), 4);
    assert_eq!(derived.get("big"), Some(&json!(true)));
    assert_eq!(derived.get("huge"), Some(&json!(false)));
    assert_eq!(derived.get("both"), Some(&json!(false)));
    assert!(!derived.contains("_n"));
}

#[test]
fn test_results_follow_declaration_order() {
    let queries = QueryAdapter::new();
    let limits = ResourceLimits::default();
    let set = SentenceSet::new(vec![gt("z", "_n", 1), parse("_n", "$.n"), gt("a", "_n", 5)]).unwrap();
    let doc = json!({"n": 3});
    let mut context = EvaluationContext::new(&set, &doc);
    let derived = Evaluator::new(&queries, &limits, today())
        .evaluate(&mut context)
        .unwrap();
    let keys: Vec<&String> = derived.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["z", "a"]);
}

#[test]
fn test_failure_keeps_resolved_values() {
    let queries = QueryAdapter::new();
    let limits = ResourceLimits::default();
    let set = SentenceSet::new(vec![
        parse("_n", "$.n"),
        Sentence::new("odd", Reference::attribute("_n"), "frobnicate").with_object(Reference::literal(2)),
    ])
    .unwrap();
    let doc = json!({"n": 7});
    let mut context = EvaluationContext::new(&set, &doc);

    let error = Evaluator::new(&queries, &limits, today())
        .evaluate_in(&mut context)
        .unwrap_err();

    assert!(matches!(error, DeriveError::UnknownVerb { ref verb, .. } if verb == "frobnicate"));
    assert_eq!(context.value("_n"), Some(&json!(7)));
    assert_eq!(context.status("_n"), Some(Status::Done));
    assert_eq!(context.status("odd"), Some(Status::Unstarted));
    assert!(context.value("odd").is_none());
}

#[test]
fn test_runtime_cycle_detection() {
    let queries = QueryAdapter::new();
    let limits = ResourceLimits::default();
    let set = SentenceSet::new(vec![
        Sentence::new("a", Reference::attribute("b"), "and").with_object(Reference::literal(true)),
        Sentence::new("b", Reference::attribute("a"), "and").with_object(Reference::literal(true)),
    ])
    .unwrap();
    let doc = json!({});
    let mut context = EvaluationContext::new(&set, &doc);

    let error = Evaluator::new(&queries, &limits, today())
        .evaluate_in(&mut context)
        .unwrap_err();

    match error {
        DeriveError::CyclicDependency { cycle, .. } => assert_eq!(cycle, vec!["a", "b", "a"]),
        other => panic!("expected a cycle, got {other}"),
    }
    assert_eq!(context.status("a"), Some(Status::Unstarted));
}

fn chain(length: usize) -> SentenceSet {
    let mut sentences = vec![parse("s0", "$.n")];
    for i in 1..length {
        sentences.push(
            Sentence::new(format!("s{}", i), Reference::attribute(format!("s{}", i - 1)), "or")
                .with_object(Reference::literal(false)),
        );
    }
    SentenceSet::new(sentences.into_iter().rev().collect()).unwrap()
}

#[test]
fn test_long_chains_resolve_without_recursion() {
    let queries = QueryAdapter::new();
    let limits = ResourceLimits::default();
    let set = chain(900);
    let doc = json!({"n": 1});
    let mut context = EvaluationContext::new(&set, &doc);
    let derived = Evaluator::new(&queries, &limits, today())
        .evaluate(&mut context)
        .unwrap();
    assert_eq!(derived.get("s899"), Some(&json!(true)));
    assert_eq!(context.evaluations(), 900);
}

#[test]
fn test_resolution_depth_is_limited() {
    let queries = QueryAdapter::new();
    let limits = ResourceLimits {
        max_resolution_depth: 10,
        ..ResourceLimits::default()
    };
    let set = chain(50);
    let doc = json!({"n": 1});
    let mut context = EvaluationContext::new(&set, &doc);
    let error = Evaluator::new(&queries, &limits, today())
        .evaluate_in(&mut context)
        .unwrap_err();
    assert!(matches!(error, DeriveError::ResourceLimitExceeded { ref limit_name, .. } if limit_name == "max_resolution_depth"));
}
