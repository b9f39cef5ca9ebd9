use crate::analysis::{build_dependency_graph, evaluation_order, find_cycle};
use crate::semantic::{Reference, Sentence, SentenceSet};
use crate::DeriveError;

fn compare(name: &str, subject: &str, object: &str) -> Sentence {
    Sentence::new(name, Reference::attribute(subject), "and").with_object(Reference::attribute(object))
}

fn parse(name: &str) -> Sentence {
    Sentence::new(name, Reference::Source, "parse").with_object(Reference::literal("$.x"))
}

#[test]
fn test_dependency_graph() {
    let set = SentenceSet::new(vec![compare("c", "a", "a"), parse("a")]).unwrap();
    let graph = build_dependency_graph(&set);
    assert_eq!(graph["c"], vec!["a".to_string()]);
    assert!(graph["a"].is_empty());
}

#[test]
fn test_evaluation_order_follows_dependencies() {
    let set = SentenceSet::new(vec![
        compare("d", "b", "c"),
        compare("c", "a", "b"),
        parse("b"),
        parse("a"),
    ])
    .unwrap();
    assert_eq!(evaluation_order(&set).unwrap(), vec!["b", "a", "c", "d"]);
}

#[test]
fn test_cycles_are_reported_as_paths() {
    let set = SentenceSet::new(vec![
        parse("root"),
        compare("a", "b", "root"),
        compare("b", "c", "root"),
        compare("c", "a", "root"),
    ])
    .unwrap();
    assert_eq!(
        find_cycle(&set),
        Some(vec!["a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()])
    );
    assert!(matches!(
        evaluation_order(&set),
        Err(DeriveError::CyclicDependency { cycle, .. }) if cycle.len() == 4
    ));
}

#[test]
fn test_self_reference_is_a_cycle() {
    let set = SentenceSet::new(vec![compare("a", "a", "a")]).unwrap();
    assert_eq!(find_cycle(&set), Some(vec!["a".to_string(), "a".to_string()]));
}

#[test]
fn test_acyclic_sets_have_no_cycle() {
    let set = SentenceSet::new(vec![compare("c", "a", "b"), parse("a"), parse("b")]).unwrap();
    assert_eq!(find_cycle(&set), None);
}
