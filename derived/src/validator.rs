//! Static checks run when sentences are added to an engine
//!
//! Everything that can be rejected without a document is rejected here:
//! unknown verbs, missing objects, malformed path expressions, oversized
//! sets and cyclic references.

use crate::analysis;
use crate::error::{DeriveError, DeriveResult};
use crate::query::QueryAdapter;
use crate::semantic::{Reference, SentenceSet};
use crate::verbs::{Arity, Verb};
use crate::ResourceLimits;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn validate(
        &self,
        sentences: &SentenceSet,
        queries: &QueryAdapter,
        limits: &ResourceLimits,
    ) -> DeriveResult<()> {
        if sentences.len() > limits.max_sentences {
            return Err(DeriveError::limit(
                "max_sentences",
                limits.max_sentences,
                sentences.len(),
                "Split the definitions into smaller sets",
            ));
        }

        for sentence in sentences {
            let verb = Verb::lookup(&sentence.verb).ok_or_else(|| DeriveError::UnknownVerb {
                sentence: sentence.name.clone(),
                verb: sentence.verb.clone(),
            })?;

            if verb.arity() == Arity::Binary && sentence.object.is_none() {
                return Err(DeriveError::invalid(
                    &sentence.name,
                    format!("verb '{}' requires an object", sentence.verb),
                ));
            }

            let Some(language) = verb.query_language() else {
                continue;
            };
            match &sentence.object {
                Some(Reference::Literal(Value::String(expression))) => {
                    if expression.len() > limits.max_expression_bytes {
                        return Err(DeriveError::limit(
                            "max_expression_bytes",
                            limits.max_expression_bytes,
                            expression.len(),
                            "Shorten the path expression or raise the limit",
                        ));
                    }
                    queries.backend(language).check(expression).map_err(|error| {
                        DeriveError::invalid(
                            &sentence.name,
                            format!("invalid {} expression '{}': {}", language, expression, error),
                        )
                    })?;
                }
                // Computed expressions are checked when they are evaluated
                Some(Reference::Attribute(_)) => {}
                _ => {
                    return Err(DeriveError::invalid(
                        &sentence.name,
                        format!("verb '{}' requires a path expression as its object", sentence.verb),
                    ));
                }
            }
        }

        if let Some(cycle) = analysis::find_cycle(sentences) {
            return Err(DeriveError::CyclicDependency {
                sentence: cycle.first().cloned().unwrap_or_default(),
                cycle,
            });
        }
        Ok(())
    }
}
