//! Path query adapter
//!
//! Sentences address the input document through path expressions in one of
//! two languages. Both built-in backends are pest grammars evaluated over
//! `serde_json::Value`; callers can substitute either one through
//! [`QueryAdapter::with_backend`].

pub mod jsonata;
pub mod jsonpath;

pub use jsonata::Jsonata;
pub use jsonpath::JsonPath;

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Path expression language of a path verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryLanguage {
    JsonPath,
    Jsonata,
}

impl QueryLanguage {
    pub fn name(&self) -> &'static str {
        match self {
            QueryLanguage::JsonPath => "jsonpath",
            QueryLanguage::Jsonata => "jsonata",
        }
    }
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a query must yield exactly one value or any number of values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Scalar,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("{0}")]
    Evaluation(String),

    #[error("expression matched nothing")]
    NoMatch,

    #[error("expression matched {0} values, expected exactly one")]
    AmbiguousMatch(usize),
}

/// A path expression language evaluated against a JSON document
pub trait QueryBackend: Send + Sync {
    /// Check that an expression parses, without evaluating it
    fn check(&self, expression: &str) -> Result<(), QueryError>;

    /// Every value the expression selects or computes, in document order
    fn evaluate_list(&self, expression: &str, document: &Value) -> Result<Vec<Value>, QueryError>;

    /// The single value the expression selects
    fn evaluate_scalar(&self, expression: &str, document: &Value) -> Result<Value, QueryError> {
        let mut matches = self.evaluate_list(expression, document)?;
        match matches.len() {
            0 => Err(QueryError::NoMatch),
            1 => Ok(matches.remove(0)),
            n => Err(QueryError::AmbiguousMatch(n)),
        }
    }
}

/// Routes path verbs to the backend for their language
pub struct QueryAdapter {
    jsonpath: Box<dyn QueryBackend>,
    jsonata: Box<dyn QueryBackend>,
}

impl Default for QueryAdapter {
    fn default() -> Self {
        Self {
            jsonpath: Box::new(JsonPath),
            jsonata: Box::new(Jsonata),
        }
    }
}

impl fmt::Debug for QueryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryAdapter").finish_non_exhaustive()
    }
}

impl QueryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the backend used for one language
    pub fn with_backend(mut self, language: QueryLanguage, backend: Box<dyn QueryBackend>) -> Self {
        match language {
            QueryLanguage::JsonPath => self.jsonpath = backend,
            QueryLanguage::Jsonata => self.jsonata = backend,
        }
        self
    }

    pub fn backend(&self, language: QueryLanguage) -> &dyn QueryBackend {
        match language {
            QueryLanguage::JsonPath => self.jsonpath.as_ref(),
            QueryLanguage::Jsonata => self.jsonata.as_ref(),
        }
    }

    /// Evaluate an expression in the given mode
    ///
    /// Scalar mode yields the single matched value, list mode a JSON array of
    /// every match.
    pub fn query(
        &self,
        language: QueryLanguage,
        mode: QueryMode,
        expression: &str,
        document: &Value,
    ) -> Result<Value, QueryError> {
        let backend = self.backend(language);
        tracing::trace!(%language, ?mode, expression, "evaluating query");
        match mode {
            QueryMode::Scalar => backend.evaluate_scalar(expression, document),
            QueryMode::List => backend.evaluate_list(expression, document).map(Value::Array),
        }
    }
}

/// Resolve backslash escapes inside a quoted name or string literal
pub(crate) fn unescape(raw: &str) -> Result<String, QueryError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| QueryError::Syntax(format!("invalid unicode escape '\\u{}'", hex)))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => return Err(QueryError::Syntax("dangling escape at end of string".to_string())),
        }
    }
    Ok(out)
}

/// Render a pest parse failure on one line
pub(crate) fn syntax_error<R: pest::RuleType>(error: pest::error::Error<R>) -> QueryError {
    let position = match error.line_col {
        pest::error::LineColLocation::Pos((_, col)) => col,
        pest::error::LineColLocation::Span((_, col), _) => col,
    };
    let detail = match &error.variant {
        pest::error::ErrorVariant::ParsingError { .. } => "unexpected input".to_string(),
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
    };
    QueryError::Syntax(format!("{} at column {}", detail, position))
}
