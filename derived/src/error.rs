use crate::value::type_name;
use serde_json::Value;
use thiserror::Error;

/// Boxed error returned by caller-supplied action handlers and query backends
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the engine can report
///
/// Variants that arise while evaluating a sentence carry that sentence's
/// name so callers can point at the offending definition.
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("Unknown verb '{verb}' in sentence '{sentence}'")]
    UnknownVerb { sentence: String, verb: String },

    #[error("Sentence '{sentence}' references unknown attribute '{reference}'")]
    UnknownReference { sentence: String, reference: String },

    #[error("Cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { sentence: String, cycle: Vec<String> },

    #[error(
        "Sentence '{sentence}': expression '{expression}' matched {matches} values, expected exactly one"
    )]
    AmbiguousMatch {
        sentence: String,
        expression: String,
        matches: usize,
    },

    #[error("Sentence '{sentence}': expression '{expression}' matched nothing")]
    NoMatch { sentence: String, expression: String },

    #[error(
        "Sentence '{sentence}': verb '{verb}' expected {expected}, got {} {value}",
        type_name(.value)
    )]
    TypeConversion {
        sentence: String,
        verb: String,
        expected: String,
        value: Value,
    },

    #[error("Sentence '{sentence}': verb '{verb}' cannot be applied to an empty list")]
    EmptyList { sentence: String, verb: String },

    #[error("Action '{action}' of trigger '{sentence}' failed: {source}")]
    ActionHandler {
        sentence: String,
        action: String,
        #[source]
        source: BoxError,
    },

    #[error("Sentence '{sentence}': query '{expression}' failed: {message}")]
    Query {
        sentence: String,
        expression: String,
        message: String,
    },

    #[error("Invalid sentence '{sentence}': {message}")]
    InvalidDefinition { sentence: String, message: String },

    #[error(
        "Resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value}). {suggestion}"
    )]
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },
}

impl DeriveError {
    /// Name of the sentence the error is attributed to, if any
    pub fn sentence(&self) -> Option<&str> {
        match self {
            DeriveError::UnknownVerb { sentence, .. }
            | DeriveError::UnknownReference { sentence, .. }
            | DeriveError::CyclicDependency { sentence, .. }
            | DeriveError::AmbiguousMatch { sentence, .. }
            | DeriveError::NoMatch { sentence, .. }
            | DeriveError::TypeConversion { sentence, .. }
            | DeriveError::EmptyList { sentence, .. }
            | DeriveError::ActionHandler { sentence, .. }
            | DeriveError::Query { sentence, .. }
            | DeriveError::InvalidDefinition { sentence, .. } => Some(sentence),
            DeriveError::ResourceLimitExceeded { .. } => None,
        }
    }

    pub(crate) fn invalid(sentence: &str, message: impl Into<String>) -> Self {
        DeriveError::InvalidDefinition {
            sentence: sentence.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn limit(
        limit_name: &str,
        limit_value: usize,
        actual_value: usize,
        suggestion: &str,
    ) -> Self {
        DeriveError::ResourceLimitExceeded {
            limit_name: limit_name.to_string(),
            limit_value: limit_value.to_string(),
            actual_value: actual_value.to_string(),
            suggestion: suggestion.to_string(),
        }
    }
}

/// Result type for engine operations
pub type DeriveResult<T> = Result<T, DeriveError>;
