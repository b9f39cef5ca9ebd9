//! JSONPath backend
//!
//! Supports child, descendant, wildcard, index, slice, union and filter
//! selectors, plus `+ - * /` between paths and numbers. Arithmetic between
//! two node sets pairs them up element by element and yields nothing when
//! their lengths differ.

mod eval;
mod parser;

use super::{QueryBackend, QueryError};
use regex::Regex;
use crate::value::Numeric;
use serde_json::Value;

pub use parser::parse;

/// The built-in JSONPath backend
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPath;

impl QueryBackend for JsonPath {
    fn check(&self, expression: &str) -> Result<(), QueryError> {
        parse(expression).map(|_| ())
    }

    fn evaluate_list(&self, expression: &str, document: &Value) -> Result<Vec<Value>, QueryError> {
        let query = parse(expression)?;
        eval::evaluate(&query, document)
    }
}

/// A parsed JSONPath expression
#[derive(Debug, Clone)]
pub enum Query {
    Path(Path),
    Number(Numeric),
    Arithmetic(Box<Query>, ArithmeticOp, Box<Query>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone)]
pub struct Path {
    pub root: Root,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    /// `$`
    Document,
    /// `@`, or a bare name inside a filter
    Current,
}

#[derive(Debug, Clone)]
pub enum Segment {
    Child(Selector),
    Descendant(Selector),
}

#[derive(Debug, Clone)]
pub enum Selector {
    Name(String),
    Wildcard,
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Union(Vec<Selector>),
    Filter(Box<Filter>),
}

#[derive(Debug, Clone)]
pub enum Filter {
    Or(Box<Filter>, Box<Filter>),
    And(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    Exists(Path),
    Compare(Operand, Comparison, Operand),
    Matches(Operand, Regex),
}

#[derive(Debug, Clone)]
pub enum Operand {
    Path(Path),
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}
