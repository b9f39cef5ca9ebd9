//! Sentence evaluation
//!
//! Resolves every sentence of a set against one document by following its
//! attribute references depth first. Each sentence is evaluated at most once
//! per run; its value is memoized in the [`EvaluationContext`].

pub mod context;
pub mod triggers;

use crate::error::{DeriveError, DeriveResult};
use crate::query::QueryAdapter;
use crate::response::Derived;
use crate::semantic::{Reference, Sentence};
use crate::verbs::{Verb, VerbEnv};
use crate::ResourceLimits;
use chrono::NaiveDate;
use context::{EvaluationContext, Status};
use serde_json::Value;
use tracing::{debug, trace};

/// Resolves sentences against a document
pub struct Evaluator<'e> {
    queries: &'e QueryAdapter,
    limits: &'e ResourceLimits,
    today: NaiveDate,
}

impl<'e> Evaluator<'e> {
    pub fn new(queries: &'e QueryAdapter, limits: &'e ResourceLimits, today: NaiveDate) -> Self {
        Self {
            queries,
            limits,
            today,
        }
    }

    /// Resolve every sentence and collect the public attributes
    pub fn evaluate(&self, context: &mut EvaluationContext<'_>) -> DeriveResult<Derived> {
        self.evaluate_in(context)?;
        Ok(Derived::collect(context))
    }

    /// Resolve every sentence, leaving the values in the context
    ///
    /// On failure the context keeps every value resolved before the error.
    pub fn evaluate_in(&self, context: &mut EvaluationContext<'_>) -> DeriveResult<()> {
        debug!(sentences = context.sentences.len(), "evaluation started");
        for position in 0..context.sentences.len() {
            self.resolve(context, position)?;
        }
        debug!(
            evaluations = context.evaluations(),
            "evaluation finished"
        );
        Ok(())
    }

    /// Resolve one sentence and everything it depends on
    ///
    /// Uses an explicit stack, so deep dependency chains are bounded by
    /// `max_resolution_depth` rather than by the call stack.
    pub fn resolve(&self, context: &mut EvaluationContext<'_>, position: usize) -> DeriveResult<()> {
        if context.status_at(position) == Status::Done {
            return Ok(());
        }
        let mut stack = vec![position];
        context.begin(position);
        let result = self.drain(context, &mut stack);
        if result.is_err() {
            for &pending in &stack {
                context.abandon(pending);
            }
        }
        result
    }

    fn drain(&self, context: &mut EvaluationContext<'_>, stack: &mut Vec<usize>) -> DeriveResult<()> {
        let sentences = context.sentences;
        while let Some(&top) = stack.last() {
            let sentence = sentences.at(top);
            match next_unresolved(context, sentence)? {
                Some(dependency) => {
                    if context.status_at(dependency) == Status::InProgress {
                        let start = stack
                            .iter()
                            .position(|&p| p == dependency)
                            .unwrap_or_default();
                        let mut cycle: Vec<String> = stack[start..]
                            .iter()
                            .map(|&p| sentences.at(p).name.clone())
                            .collect();
                        cycle.push(sentences.at(dependency).name.clone());
                        return Err(DeriveError::CyclicDependency {
                            sentence: sentences.at(dependency).name.clone(),
                            cycle,
                        });
                    }
                    if stack.len() >= self.limits.max_resolution_depth {
                        return Err(DeriveError::limit(
                            "max_resolution_depth",
                            self.limits.max_resolution_depth,
                            stack.len() + 1,
                            "Flatten the chain of attribute references or raise the limit",
                        ));
                    }
                    context.begin(dependency);
                    stack.push(dependency);
                }
                None => {
                    let value = self.apply(context, sentence)?;
                    trace!(sentence = %sentence.name, verb = %sentence.verb, %value, "sentence resolved");
                    context.finish(top, value);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Apply a sentence's verb to its resolved operands
    fn apply(&self, context: &EvaluationContext<'_>, sentence: &Sentence) -> DeriveResult<Value> {
        let verb = Verb::lookup(&sentence.verb).ok_or_else(|| DeriveError::UnknownVerb {
            sentence: sentence.name.clone(),
            verb: sentence.verb.clone(),
        })?;
        let subject = operand(context, sentence, &sentence.subject)?;
        let object = sentence
            .object
            .as_ref()
            .map(|reference| operand(context, sentence, reference))
            .transpose()?;
        let env = VerbEnv {
            queries: self.queries,
            today: self.today,
            max_expression_bytes: self.limits.max_expression_bytes,
        };
        verb.apply(subject, object, &env)
            .map_err(|error| error.into_derive_error(&sentence.name, &sentence.verb))
    }
}

/// First attribute the sentence depends on that is not yet resolved
fn next_unresolved(context: &EvaluationContext<'_>, sentence: &Sentence) -> DeriveResult<Option<usize>> {
    for name in sentence.dependencies() {
        let position = context
            .sentences
            .position(name)
            .ok_or_else(|| DeriveError::UnknownReference {
                sentence: sentence.name.clone(),
                reference: name.to_string(),
            })?;
        if context.status_at(position) != Status::Done {
            return Ok(Some(position));
        }
    }
    Ok(None)
}

fn operand<'c>(
    context: &'c EvaluationContext<'_>,
    sentence: &Sentence,
    reference: &'c Reference,
) -> DeriveResult<&'c Value> {
    match reference {
        Reference::Source => Ok(context.document),
        Reference::Literal(value) => Ok(value),
        Reference::Attribute(name) => context.value(name).ok_or_else(|| DeriveError::UnknownReference {
            sentence: sentence.name.clone(),
            reference: name.clone(),
        }),
    }
}
