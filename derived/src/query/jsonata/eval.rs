use super::functions;
use super::{BinaryOp, Node, Step};
use crate::query::QueryError;
use crate::value::{to_number, values_equal, Numeric};
use serde_json::Value;
use std::cmp::Ordering;

/// Result of evaluating an expression
///
/// Sequences of one item collapse to a single value and empty sequences to
/// `Undefined`.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Output {
    Undefined,
    Single(Value),
    Sequence(Vec<Value>),
}

impl Output {
    pub(super) fn from_items(mut items: Vec<Value>) -> Self {
        match items.len() {
            0 => Output::Undefined,
            1 => items.pop().map_or(Output::Undefined, Output::Single),
            _ => Output::Sequence(items),
        }
    }

    /// One match per sequence item, or the single value
    pub(super) fn into_matches(self) -> Vec<Value> {
        match self {
            Output::Undefined => Vec::new(),
            Output::Single(value) => vec![value],
            Output::Sequence(items) => items,
        }
    }

    /// Items with a top-level array unpacked, as function arguments see them
    pub(super) fn into_items(self) -> Vec<Value> {
        match self {
            Output::Undefined => Vec::new(),
            Output::Single(Value::Array(items)) => items,
            Output::Single(value) => vec![value],
            Output::Sequence(items) => items,
        }
    }

    pub(super) fn is_undefined(&self) -> bool {
        matches!(self, Output::Undefined)
    }

    /// The whole result as one JSON value, sequences becoming arrays
    pub(super) fn into_value(self) -> Option<Value> {
        match self {
            Output::Undefined => None,
            Output::Single(value) => Some(value),
            Output::Sequence(items) => Some(Value::Array(items)),
        }
    }
}

pub(super) fn evaluate(node: &Node, context: &Value, root: &Value) -> Result<Output, QueryError> {
    match node {
        Node::Literal(value) => Ok(Output::Single(value.clone())),
        Node::Context => Ok(Output::Single(context.clone())),
        Node::Root => Ok(Output::Single(root.clone())),
        Node::Field(name) => Ok(field(context, name)),
        Node::Wildcard => Ok(Output::from_items(wildcard(context))),
        Node::Descendants => {
            let mut out = Vec::new();
            descendants(context, &mut out);
            Ok(Output::from_items(out))
        }
        Node::Path(steps) => path(steps, context, root),
        Node::Array(elements) => {
            let mut items = Vec::new();
            for element in elements {
                match evaluate(element, context, root)? {
                    Output::Undefined => {}
                    Output::Single(value) => items.push(value),
                    Output::Sequence(values) => items.extend(values),
                }
            }
            Ok(Output::Single(Value::Array(items)))
        }
        Node::Block(expressions) => {
            let mut last = Output::Undefined;
            for expression in expressions {
                last = evaluate(expression, context, root)?;
            }
            Ok(last)
        }
        Node::Function(name, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, context, root))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(name, args)
        }
        Node::Negate(operand) => match evaluate(operand, context, root)? {
            Output::Undefined => Ok(Output::Undefined),
            output => {
                let n = number_operand(output, "-")?;
                Ok(Output::Single((-n).into_value()))
            }
        },
        Node::And(left, right) => {
            let result = truthy(&evaluate(left, context, root)?)
                && truthy(&evaluate(right, context, root)?);
            Ok(Output::Single(Value::Bool(result)))
        }
        Node::Or(left, right) => {
            let result = truthy(&evaluate(left, context, root)?)
                || truthy(&evaluate(right, context, root)?);
            Ok(Output::Single(Value::Bool(result)))
        }
        Node::Condition(condition, then, otherwise) => {
            if truthy(&evaluate(condition, context, root)?) {
                evaluate(then, context, root)
            } else {
                match otherwise {
                    Some(otherwise) => evaluate(otherwise, context, root),
                    None => Ok(Output::Undefined),
                }
            }
        }
        Node::Binary(left, op, right) => binary(
            evaluate(left, context, root)?,
            *op,
            evaluate(right, context, root)?,
        ),
    }
}

/// Field lookup that maps over arrays
fn field(context: &Value, name: &str) -> Output {
    match context {
        Value::Object(members) => members
            .get(name)
            .map_or(Output::Undefined, |value| Output::Single(value.clone())),
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                match field(item, name) {
                    Output::Undefined => {}
                    Output::Single(Value::Array(values)) => out.extend(values),
                    Output::Single(value) => out.push(value),
                    Output::Sequence(values) => out.extend(values),
                }
            }
            Output::from_items(out)
        }
        _ => Output::Undefined,
    }
}

fn wildcard(context: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    match context {
        Value::Object(members) => {
            for value in members.values() {
                match value {
                    Value::Array(items) => out.extend(items.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| out.extend(wildcard(item))),
        _ => {}
    }
    out
}

fn descendants(context: &Value, out: &mut Vec<Value>) {
    match context {
        Value::Object(members) => {
            for value in members.values() {
                if !value.is_array() {
                    out.push(value.clone());
                }
                descendants(value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                if !item.is_array() {
                    out.push(item.clone());
                }
                descendants(item, out);
            }
        }
        _ => {}
    }
}

/// Evaluate steps left to right, each against every item the previous step
/// produced, flattening arrays into the running sequence
fn path(steps: &[Step], context: &Value, root: &Value) -> Result<Output, QueryError> {
    let mut current = vec![context.clone()];
    for step in steps {
        let mut next = Vec::new();
        for item in &current {
            let mut produced = match evaluate(&step.node, item, root)? {
                Output::Undefined => Vec::new(),
                Output::Single(Value::Array(values)) => values,
                Output::Single(value) => vec![value],
                Output::Sequence(values) => values,
            };
            for predicate in &step.predicates {
                produced = filter(predicate, produced, root)?;
            }
            next.extend(produced);
        }
        current = next;
    }
    Ok(Output::from_items(current))
}

/// Keep the items a predicate selects
///
/// A numeric predicate selects by position, negative positions counting from
/// the end; anything else is cast to boolean per item.
fn filter(predicate: &Node, items: Vec<Value>, root: &Value) -> Result<Vec<Value>, QueryError> {
    let len = items.len() as i64;
    let mut kept = Vec::new();
    for (position, item) in items.into_iter().enumerate() {
        let result = evaluate(predicate, &item, root)?;
        let selected = match numeric_indexes(&result) {
            Some(indexes) => indexes.into_iter().any(|index| {
                let index = if index < 0 { index + len } else { index };
                index == position as i64
            }),
            None => truthy(&result),
        };
        if selected {
            kept.push(item);
        }
    }
    Ok(kept)
}

fn numeric_indexes(output: &Output) -> Option<Vec<i64>> {
    let floor = |value: &Value| to_number(value).and_then(|n| n.floor().trunc_i64());
    match output {
        Output::Single(Value::Array(values)) | Output::Sequence(values) if !values.is_empty() => {
            values.iter().map(floor).collect()
        }
        Output::Single(value) => floor(value).map(|index| vec![index]),
        _ => None,
    }
}

/// Boolean cast: arrays are true when any member is
pub(super) fn truthy(output: &Output) -> bool {
    match output {
        Output::Undefined => false,
        Output::Single(value) => value_truthy(value),
        Output::Sequence(values) => values.iter().any(value_truthy),
    }
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => to_number(value).is_some_and(|n| !n.is_zero()),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => items.iter().any(value_truthy),
        Value::Object(members) => !members.is_empty(),
    }
}

pub(super) fn number_operand(output: Output, operator: &str) -> Result<Numeric, QueryError> {
    match output {
        Output::Single(value) => to_number(&value).ok_or_else(|| {
            QueryError::Evaluation(format!(
                "the operand of '{}' must be a number, got {}",
                operator, value
            ))
        }),
        other => Err(QueryError::Evaluation(format!(
            "the operand of '{}' must be a single number, got {}",
            operator,
            other.into_value().unwrap_or(Value::Null)
        ))),
    }
}

fn binary(left: Output, op: BinaryOp, right: Output) -> Result<Output, QueryError> {
    match op {
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo => {
            if left.is_undefined() || right.is_undefined() {
                return Ok(Output::Undefined);
            }
            let symbol = match op {
                BinaryOp::Add => "+",
                BinaryOp::Subtract => "-",
                BinaryOp::Multiply => "*",
                BinaryOp::Divide => "/",
                _ => "%",
            };
            let a = number_operand(left, symbol)?;
            let b = number_operand(right, symbol)?;
            if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) && b.is_zero() {
                return Err(QueryError::Evaluation("division by zero".to_string()));
            }
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Subtract => a.checked_sub(b),
                BinaryOp::Multiply => a.checked_mul(b),
                BinaryOp::Divide => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result
                .map(|n| Output::Single(n.into_value()))
                .ok_or_else(|| QueryError::Evaluation("number out of range".to_string()))
        }
        BinaryOp::Concat => {
            let text = |output: Output| match output.into_value() {
                None => String::new(),
                Some(value) => functions::stringify(&value),
            };
            Ok(Output::Single(Value::String(text(left) + &text(right))))
        }
        BinaryOp::Equal | BinaryOp::NotEqual => {
            let equal = match (left.into_value(), right.into_value()) {
                (Some(a), Some(b)) => values_equal(&a, &b),
                _ => return Ok(Output::Single(Value::Bool(false))),
            };
            Ok(Output::Single(Value::Bool(equal == (op == BinaryOp::Equal))))
        }
        BinaryOp::In => {
            let Some(needle) = left.into_value() else {
                return Ok(Output::Single(Value::Bool(false)));
            };
            let found = right.into_items().iter().any(|item| values_equal(item, &needle));
            Ok(Output::Single(Value::Bool(found)))
        }
        BinaryOp::Less | BinaryOp::LessOrEqual | BinaryOp::Greater | BinaryOp::GreaterOrEqual => {
            let (Some(a), Some(b)) = (left.into_value(), right.into_value()) else {
                return Ok(Output::Single(Value::Bool(false)));
            };
            let ordering = match (&a, &b) {
                (Value::Number(_), Value::Number(_)) => to_number(&a)
                    .zip(to_number(&b))
                    .map(|(x, y)| x.cmp(&y)),
                (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
                _ => None,
            };
            let ordering = ordering.ok_or_else(|| {
                QueryError::Evaluation(format!(
                    "cannot compare {} with {}: both sides must be numbers or both strings",
                    a, b
                ))
            })?;
            let result = match op {
                BinaryOp::Less => ordering == Ordering::Less,
                BinaryOp::LessOrEqual => ordering != Ordering::Greater,
                BinaryOp::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Output::Single(Value::Bool(result)))
        }
    }
}
