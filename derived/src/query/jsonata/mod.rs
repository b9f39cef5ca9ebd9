//! JSONata backend
//!
//! Evaluates the navigational core of JSONata: dotted paths that map over
//! arrays and flatten the results into sequences, predicates that index or
//! filter, arithmetic and comparison operators, conditionals and a set of
//! built-in functions. A sequence or array result yields one match per
//! item in list mode, while scalar mode returns an array result whole.

mod eval;
mod functions;
mod parser;

use super::{QueryBackend, QueryError};
use serde_json::Value;

pub use parser::parse;

/// The built-in JSONata backend
#[derive(Debug, Clone, Copy, Default)]
pub struct Jsonata;

impl QueryBackend for Jsonata {
    fn check(&self, expression: &str) -> Result<(), QueryError> {
        parse(expression).map(|_| ())
    }

    fn evaluate_list(&self, expression: &str, document: &Value) -> Result<Vec<Value>, QueryError> {
        let node = parse(expression)?;
        Ok(eval::evaluate(&node, document, document)?.into_items())
    }

    fn evaluate_scalar(&self, expression: &str, document: &Value) -> Result<Value, QueryError> {
        let node = parse(expression)?;
        let mut matches = eval::evaluate(&node, document, document)?.into_matches();
        match matches.len() {
            0 => Err(QueryError::NoMatch),
            1 => Ok(matches.remove(0)),
            n => Err(QueryError::AmbiguousMatch(n)),
        }
    }
}

/// A parsed JSONata expression
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Value),
    Field(String),
    Wildcard,
    Descendants,
    /// `$`, the current context item
    Context,
    /// `$$`, the input document
    Root,
    Path(Vec<Step>),
    Array(Vec<Node>),
    Block(Vec<Node>),
    Function(String, Vec<Node>),
    Negate(Box<Node>),
    Binary(Box<Node>, BinaryOp, Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Condition(Box<Node>, Box<Node>, Option<Box<Node>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub node: Node,
    pub predicates: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    In,
}
