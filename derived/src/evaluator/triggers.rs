//! Action dispatch for trigger sentences

use super::context::EvaluationContext;
use crate::error::{BoxError, DeriveError, DeriveResult};
use crate::response::ActionRecord;
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Receives the actions of triggers that fired
pub trait EventHandler {
    fn handle(&mut self, action: &str, params: &Map<String, Value>) -> Result<(), BoxError>;
}

impl<F> EventHandler for F
where
    F: FnMut(&str, &Map<String, Value>) -> Result<(), BoxError>,
{
    fn handle(&mut self, action: &str, params: &Map<String, Value>) -> Result<(), BoxError> {
        self(action, params)
    }
}

/// Dispatch every trigger whose value is exactly `true`, in declaration order
///
/// Expects every sentence to be resolved already. The first handler failure
/// stops dispatch.
pub fn dispatch<H>(context: &EvaluationContext<'_>, handler: &mut H) -> DeriveResult<Vec<ActionRecord>>
where
    H: EventHandler + ?Sized,
{
    let mut records = Vec::new();
    for sentence in context.sentences.triggers() {
        let Some(action) = &sentence.action else {
            continue;
        };
        if context.value(&sentence.name) != Some(&Value::Bool(true)) {
            trace!(trigger = %sentence.name, "trigger did not fire");
            continue;
        }

        let mut params = Map::new();
        for name in &sentence.params {
            let value = context.value(name).ok_or_else(|| DeriveError::UnknownReference {
                sentence: sentence.name.clone(),
                reference: name.clone(),
            })?;
            params.insert(name.clone(), value.clone());
        }

        debug!(trigger = %sentence.name, action = %action, "dispatching action");
        handler
            .handle(action, &params)
            .map_err(|source| DeriveError::ActionHandler {
                sentence: sentence.name.clone(),
                action: action.clone(),
                source,
            })?;
        records.push(ActionRecord {
            sentence: sentence.name.clone(),
            action: action.clone(),
            params,
        });
    }
    Ok(records)
}
