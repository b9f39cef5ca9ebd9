//! The verb library
//!
//! Every verb name maps to one [`Verb`] through a static table; evaluation
//! dispatches on the enum, so the set of verbs is closed and checked at
//! compile time.

mod aggregate;
mod compare;
mod dates;

pub use aggregate::Aggregate;
pub use compare::{Comparison, Logical};

use crate::error::DeriveError;
use crate::query::{QueryAdapter, QueryError, QueryLanguage, QueryMode};
use chrono::NaiveDate;
use serde_json::Value;
use QueryLanguage::{JsonPath, Jsonata};

/// Whether a verb needs an object operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `>`, `<`, `=`, `!=`
    Compare(Comparison),
    /// `eq` / `neq`: equality without numeric coercion
    Identity { negated: bool },
    Logic(Logical),
    Aggregate(Aggregate),
    ListDivide,
    WithinLastDays,
    ListWithinLastDays,
    /// Single-value path query
    Parse(QueryLanguage),
    /// Multi-value path query, optionally aggregated
    ParseList(QueryLanguage, Option<Aggregate>),
}

static VERBS: &[(&str, Verb)] = &[
    (">", Verb::Compare(Comparison::GreaterThan)),
    ("<", Verb::Compare(Comparison::LessThan)),
    ("=", Verb::Compare(Comparison::Equal)),
    ("!=", Verb::Compare(Comparison::NotEqual)),
    ("eq", Verb::Identity { negated: false }),
    ("neq", Verb::Identity { negated: true }),
    ("and", Verb::Logic(Logical::And)),
    ("or", Verb::Logic(Logical::Or)),
    ("len", Verb::Aggregate(Aggregate::Len)),
    ("sum", Verb::Aggregate(Aggregate::Sum)),
    ("min", Verb::Aggregate(Aggregate::Min)),
    ("max", Verb::Aggregate(Aggregate::Max)),
    ("mean", Verb::Aggregate(Aggregate::Mean)),
    ("median", Verb::Aggregate(Aggregate::Median)),
    ("list_divide", Verb::ListDivide),
    ("within_last_days", Verb::WithinLastDays),
    ("list_within_last_days", Verb::ListWithinLastDays),
    ("parse", Verb::Parse(JsonPath)),
    ("parse_list", Verb::ParseList(JsonPath, None)),
    ("parse_len", Verb::ParseList(JsonPath, Some(Aggregate::Len))),
    ("parse_sum", Verb::ParseList(JsonPath, Some(Aggregate::Sum))),
    ("parse_min", Verb::ParseList(JsonPath, Some(Aggregate::Min))),
    ("parse_max", Verb::ParseList(JsonPath, Some(Aggregate::Max))),
    ("parse_mean", Verb::ParseList(JsonPath, Some(Aggregate::Mean))),
    ("parse_median", Verb::ParseList(JsonPath, Some(Aggregate::Median))),
    ("parse_jsonata", Verb::Parse(Jsonata)),
    ("parse_list_jsonata", Verb::ParseList(Jsonata, None)),
    ("parse_len_jsonata", Verb::ParseList(Jsonata, Some(Aggregate::Len))),
    ("parse_sum_jsonata", Verb::ParseList(Jsonata, Some(Aggregate::Sum))),
    ("parse_min_jsonata", Verb::ParseList(Jsonata, Some(Aggregate::Min))),
    ("parse_max_jsonata", Verb::ParseList(Jsonata, Some(Aggregate::Max))),
    ("parse_mean_jsonata", Verb::ParseList(Jsonata, Some(Aggregate::Mean))),
    ("parse_median_jsonata", Verb::ParseList(Jsonata, Some(Aggregate::Median))),
];

/// What a verb needs from its caller besides its operands
pub struct VerbEnv<'a> {
    pub queries: &'a QueryAdapter,
    pub today: NaiveDate,
    pub max_expression_bytes: usize,
}

/// Failure of a single verb application, before it is attributed to a sentence
#[derive(Debug, Clone, PartialEq)]
pub enum VerbError {
    TypeConversion { expected: &'static str, value: Value },
    EmptyList,
    MissingObject,
    NoMatch { expression: String },
    AmbiguousMatch { expression: String, matches: usize },
    Query { expression: String, message: String },
    ExpressionTooLong { length: usize, limit: usize },
}

impl VerbError {
    pub(crate) fn type_conversion(expected: &'static str, value: &Value) -> Self {
        VerbError::TypeConversion {
            expected,
            value: value.clone(),
        }
    }

    pub(crate) fn into_derive_error(self, sentence: &str, verb: &str) -> DeriveError {
        let sentence = sentence.to_string();
        match self {
            VerbError::TypeConversion { expected, value } => DeriveError::TypeConversion {
                sentence,
                verb: verb.to_string(),
                expected: expected.to_string(),
                value,
            },
            VerbError::EmptyList => DeriveError::EmptyList {
                sentence,
                verb: verb.to_string(),
            },
            VerbError::MissingObject => DeriveError::InvalidDefinition {
                sentence,
                message: format!("verb '{}' requires an object", verb),
            },
            VerbError::NoMatch { expression } => DeriveError::NoMatch { sentence, expression },
            VerbError::AmbiguousMatch { expression, matches } => DeriveError::AmbiguousMatch {
                sentence,
                expression,
                matches,
            },
            VerbError::Query { expression, message } => DeriveError::Query {
                sentence,
                expression,
                message,
            },
            VerbError::ExpressionTooLong { length, limit } => DeriveError::limit(
                "max_expression_bytes",
                limit,
                length,
                "Shorten the path expression or raise the limit",
            ),
        }
    }
}

impl Verb {
    /// Look up a verb by its name
    pub fn lookup(name: &str) -> Option<Verb> {
        VERBS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, verb)| *verb)
    }

    /// Every verb with its name, in table order
    pub fn all() -> impl Iterator<Item = (&'static str, Verb)> {
        VERBS.iter().copied()
    }

    pub fn arity(&self) -> Arity {
        match self {
            Verb::Aggregate(_) => Arity::Unary,
            _ => Arity::Binary,
        }
    }

    /// Language of the path expression a path verb takes as its object
    pub fn query_language(&self) -> Option<QueryLanguage> {
        match self {
            Verb::Parse(language) | Verb::ParseList(language, _) => Some(*language),
            _ => None,
        }
    }

    /// Apply the verb to resolved operands
    pub fn apply(
        &self,
        subject: &Value,
        object: Option<&Value>,
        env: &VerbEnv<'_>,
    ) -> Result<Value, VerbError> {
        let required = || object.ok_or(VerbError::MissingObject);
        match self {
            Verb::Aggregate(aggregate) => aggregate.apply(subject),
            Verb::Compare(comparison) => comparison.apply(subject, required()?).map(Value::Bool),
            Verb::Identity { negated } => {
                Ok(Value::Bool(compare::identical(subject, required()?) != *negated))
            }
            Verb::Logic(logical) => Ok(Value::Bool(logical.apply(subject, required()?))),
            Verb::ListDivide => aggregate::list_divide(subject, required()?),
            Verb::WithinLastDays => dates::within_last_days(subject, required()?, env.today).map(Value::Bool),
            Verb::ListWithinLastDays => dates::list_within_last_days(subject, required()?, env.today),
            Verb::Parse(language) => query(env, *language, QueryMode::Scalar, subject, required()?),
            Verb::ParseList(language, aggregate) => {
                let list = query(env, *language, QueryMode::List, subject, required()?)?;
                match aggregate {
                    Some(aggregate) => aggregate.apply(&list),
                    None => Ok(list),
                }
            }
        }
    }
}

fn query(
    env: &VerbEnv<'_>,
    language: QueryLanguage,
    mode: QueryMode,
    document: &Value,
    expression: &Value,
) -> Result<Value, VerbError> {
    let Value::String(expression) = expression else {
        return Err(VerbError::type_conversion("a path expression string", expression));
    };
    if expression.len() > env.max_expression_bytes {
        return Err(VerbError::ExpressionTooLong {
            length: expression.len(),
            limit: env.max_expression_bytes,
        });
    }
    env.queries
        .query(language, mode, expression, document)
        .map_err(|error| match error {
            QueryError::NoMatch => VerbError::NoMatch {
                expression: expression.clone(),
            },
            QueryError::AmbiguousMatch(matches) => VerbError::AmbiguousMatch {
                expression: expression.clone(),
                matches,
            },
            other => VerbError::Query {
                expression: expression.clone(),
                message: other.to_string(),
            },
        })
}
