use derived::{BoxError, DeriveError, Engine, EventHandler, SentenceRecord};
use serde_json::{json, Map, Value};

/// Collects dispatched actions and fails on a chosen one
#[derive(Default)]
struct Outbox {
    sent: Vec<(String, Map<String, Value>)>,
    fail_on: Option<&'static str>,
}

impl EventHandler for Outbox {
    fn handle(&mut self, action: &str, params: &Map<String, Value>) -> Result<(), BoxError> {
        if self.fail_on == Some(action) {
            return Err(format!("cannot deliver {action}").into());
        }
        self.sent.push((action.to_string(), params.clone()));
        Ok(())
    }
}

fn alerting_engine() -> Engine {
    Engine::from_records(vec![
        SentenceRecord::new("_host", "source", "parse").object("$.host"),
        SentenceRecord::new("_load", "source", "parse").object("$.load"),
        SentenceRecord::new("high_load", "_load", ">")
            .object(0.8)
            .action("page", ["_host", "_load"]),
        SentenceRecord::new("any_load", "_load", ">")
            .object(0)
            .action("log", ["_host"]),
    ])
    .unwrap()
}

#[test]
fn test_struct_handlers_receive_actions_in_declaration_order() {
    let mut outbox = Outbox::default();
    let outcome = alerting_engine()
        .derive_triggers(&json!({"host": "db-1", "load": 0.93}), &mut outbox)
        .unwrap();

    let actions: Vec<&str> = outbox.sent.iter().map(|(a, _)| a.as_str()).collect();
    assert_eq!(actions, vec!["page", "log"]);
    assert_eq!(
        Value::Object(outbox.sent[0].1.clone()),
        json!({"_host": "db-1", "_load": 0.93})
    );
    assert_eq!(outcome.attributes.to_json(), json!({"high_load": true, "any_load": true}));
}

#[test]
fn test_handler_failure_stops_dispatch() {
    let mut outbox = Outbox {
        fail_on: Some("page"),
        ..Outbox::default()
    };
    let result = alerting_engine().derive_triggers(&json!({"host": "db-1", "load": 0.93}), &mut outbox);

    match result {
        Err(DeriveError::ActionHandler {
            sentence,
            action,
            source,
        }) => {
            assert_eq!(sentence, "high_load");
            assert_eq!(action, "page");
            assert_eq!(source.to_string(), "cannot deliver page");
        }
        Err(other) => panic!("expected ActionHandler, got {other}"),
        Ok(_) => panic!("expected ActionHandler"),
    }
    assert!(outbox.sent.is_empty());
}

#[test]
fn test_false_triggers_are_skipped() {
    let mut outbox = Outbox::default();
    let outcome = alerting_engine()
        .derive_triggers(&json!({"host": "db-2", "load": 0.2}), &mut outbox)
        .unwrap();

    assert_eq!(outbox.sent.len(), 1);
    assert_eq!(outbox.sent[0].0, "log");
    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].sentence, "any_load");
}

#[test]
fn test_evaluation_errors_prevent_dispatch() {
    let mut outbox = Outbox::default();
    let result = alerting_engine().derive_triggers(&json!({"host": "db-3"}), &mut outbox);

    assert!(matches!(result, Err(DeriveError::NoMatch { .. })));
    assert!(outbox.sent.is_empty());
}

#[test]
fn test_params_from_records_accept_joined_strings() {
    let records: Vec<SentenceRecord> = serde_json::from_value(json!([
        {"attr": "_id", "subject": "source", "verb": "parse", "obj": "$.id"},
        {"attr": "_region", "subject": "source", "verb": "parse", "obj": "$.region"},
        {"attr": "flagged", "subject": "source", "verb": "parse", "obj": "$.flagged",
         "action": "review", "params": "_id, _region"}
    ]))
    .unwrap();
    let engine = Engine::from_records(records).unwrap();

    let mut outbox = Outbox::default();
    engine
        .derive_triggers(&json!({"id": "A-1", "region": "eu", "flagged": true}), &mut outbox)
        .unwrap();

    assert_eq!(
        Value::Object(outbox.sent[0].1.clone()),
        json!({"_id": "A-1", "_region": "eu"})
    );
}
