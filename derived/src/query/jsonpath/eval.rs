use super::{ArithmeticOp, Comparison, Filter, Operand, Path, Query, Root, Segment, Selector};
use crate::query::QueryError;
use crate::value::{to_number, values_equal, Numeric};
use serde_json::Value;
use std::cmp::Ordering;

/// Intermediate result of an arithmetic expression
enum Computed {
    Nodes(Vec<Value>),
    Number(Numeric),
}

pub(super) fn evaluate(query: &Query, document: &Value) -> Result<Vec<Value>, QueryError> {
    match compute(query, document)? {
        Computed::Nodes(nodes) => Ok(nodes),
        Computed::Number(n) => Ok(vec![n.into_value()]),
    }
}

fn compute(query: &Query, document: &Value) -> Result<Computed, QueryError> {
    match query {
        Query::Path(path) => Ok(Computed::Nodes(
            select(path, document, document).into_iter().cloned().collect(),
        )),
        Query::Number(n) => Ok(Computed::Number(*n)),
        Query::Arithmetic(left, op, right) => {
            combine(compute(left, document)?, *op, compute(right, document)?)
        }
    }
}

/// Apply an operator across node sets
///
/// Two node sets are paired up element by element and must be the same
/// non-zero length; a number applies to every node. Any non-numeric node
/// makes the whole result empty.
fn combine(left: Computed, op: ArithmeticOp, right: Computed) -> Result<Computed, QueryError> {
    let pairs: Vec<(Numeric, Numeric)> = match (left, right) {
        (Computed::Number(a), Computed::Number(b)) => {
            return apply(a, op, b).map(Computed::Number);
        }
        (Computed::Nodes(nodes), Computed::Number(b)) => {
            match nodes.iter().map(to_number).collect::<Option<Vec<_>>>() {
                Some(numbers) => numbers.into_iter().map(|a| (a, b)).collect(),
                None => return Ok(Computed::Nodes(Vec::new())),
            }
        }
        (Computed::Number(a), Computed::Nodes(nodes)) => {
            match nodes.iter().map(to_number).collect::<Option<Vec<_>>>() {
                Some(numbers) => numbers.into_iter().map(|b| (a, b)).collect(),
                None => return Ok(Computed::Nodes(Vec::new())),
            }
        }
        (Computed::Nodes(left), Computed::Nodes(right)) => {
            if left.is_empty() || left.len() != right.len() {
                return Ok(Computed::Nodes(Vec::new()));
            }
            let zipped = left
                .iter()
                .zip(&right)
                .map(|(a, b)| Some((to_number(a)?, to_number(b)?)))
                .collect::<Option<Vec<_>>>();
            match zipped {
                Some(pairs) => pairs,
                None => return Ok(Computed::Nodes(Vec::new())),
            }
        }
    };

    pairs
        .into_iter()
        .map(|(a, b)| apply(a, op, b).map(Numeric::into_value))
        .collect::<Result<Vec<_>, _>>()
        .map(Computed::Nodes)
}

fn apply(a: Numeric, op: ArithmeticOp, b: Numeric) -> Result<Numeric, QueryError> {
    let result = match op {
        ArithmeticOp::Add => a.checked_add(b),
        ArithmeticOp::Subtract => a.checked_sub(b),
        ArithmeticOp::Multiply => a.checked_mul(b),
        ArithmeticOp::Divide => {
            if b.is_zero() {
                return Err(QueryError::Evaluation("division by zero".to_string()));
            }
            a.checked_div(b)
        }
    };
    result.ok_or_else(|| QueryError::Evaluation("arithmetic overflow".to_string()))
}

/// Nodes selected by a path, in document order
fn select<'a>(path: &Path, root: &'a Value, current: &'a Value) -> Vec<&'a Value> {
    let start = match path.root {
        Root::Document => root,
        Root::Current => current,
    };
    let mut nodes = vec![start];
    for segment in &path.segments {
        let mut next = Vec::new();
        for node in nodes {
            match segment {
                Segment::Child(selector) => apply_selector(selector, node, root, &mut next),
                Segment::Descendant(selector) => {
                    let mut descendants = Vec::new();
                    collect_descendants(node, &mut descendants);
                    for descendant in descendants {
                        apply_selector(selector, descendant, root, &mut next);
                    }
                }
            }
        }
        nodes = next;
    }
    nodes
}

/// The node itself followed by every nested value, pre-order
fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Array(items) => items.iter().for_each(|item| collect_descendants(item, out)),
        Value::Object(members) => members.values().for_each(|v| collect_descendants(v, out)),
        _ => {}
    }
}

fn children(node: &Value) -> Vec<&Value> {
    match node {
        Value::Array(items) => items.iter().collect(),
        Value::Object(members) => members.values().collect(),
        _ => Vec::new(),
    }
}

fn apply_selector<'a>(selector: &Selector, node: &'a Value, root: &'a Value, out: &mut Vec<&'a Value>) {
    match selector {
        Selector::Name(name) => {
            if let Some(child) = node.as_object().and_then(|members| members.get(name)) {
                out.push(child);
            }
        }
        Selector::Wildcard => out.extend(children(node)),
        Selector::Index(index) => {
            if let Some(items) = node.as_array() {
                let len = items.len() as i64;
                let position = if *index < 0 { len + index } else { *index };
                if (0..len).contains(&position) {
                    out.push(&items[position as usize]);
                }
            }
        }
        Selector::Slice { start, end, step } => {
            if let Some(items) = node.as_array() {
                for position in slice_positions(items.len() as i64, *start, *end, step.unwrap_or(1)) {
                    out.push(&items[position]);
                }
            }
        }
        Selector::Union(selectors) => {
            for selector in selectors {
                apply_selector(selector, node, root, out);
            }
        }
        Selector::Filter(filter) => {
            out.extend(children(node).into_iter().filter(|child| test(filter, child, root)));
        }
    }
}

/// Positions selected by a slice, following negative-index slice rules
fn slice_positions(len: i64, start: Option<i64>, end: Option<i64>, step: i64) -> Vec<usize> {
    if step == 0 || len == 0 {
        return Vec::new();
    }
    let clamp = |bound: i64, low: i64, high: i64| {
        let bound = if bound < 0 { bound + len } else { bound };
        bound.clamp(low, high)
    };
    let mut positions = Vec::new();
    if step > 0 {
        let mut i = start.map_or(0, |s| clamp(s, 0, len));
        let stop = end.map_or(len, |e| clamp(e, 0, len));
        while i < stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else {
        let mut i = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let stop = end.map_or(-1, |e| clamp(e, -1, len - 1));
        while i > stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    positions
}

fn test(filter: &Filter, current: &Value, root: &Value) -> bool {
    match filter {
        Filter::Or(left, right) => test(left, current, root) || test(right, current, root),
        Filter::And(left, right) => test(left, current, root) && test(right, current, root),
        Filter::Not(inner) => !test(inner, current, root),
        Filter::Exists(path) => !select(path, root, current).is_empty(),
        Filter::Compare(left, op, right) => {
            match (operand(left, current, root), operand(right, current, root)) {
                (Some(l), Some(r)) => compare(l, *op, r),
                _ => false,
            }
        }
        Filter::Matches(left, regex) => match operand(left, current, root) {
            Some(Value::String(text)) => regex.is_match(text),
            _ => false,
        },
    }
}

/// First value an operand refers to, if any
fn operand<'a>(operand: &'a Operand, current: &'a Value, root: &'a Value) -> Option<&'a Value> {
    match operand {
        Operand::Literal(value) => Some(value),
        Operand::Path(path) => select(path, root, current).into_iter().next(),
    }
}

fn compare(left: &Value, op: Comparison, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Number(_), Value::Number(_)) => to_number(left).zip(to_number(right)).map(|(a, b)| a.cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match (op, ordering) {
        (Comparison::Equal, _) => values_equal(left, right),
        (Comparison::NotEqual, _) => !values_equal(left, right),
        (Comparison::Less, Some(o)) => o == Ordering::Less,
        (Comparison::LessOrEqual, Some(o)) => o != Ordering::Greater,
        (Comparison::Greater, Some(o)) => o == Ordering::Greater,
        (Comparison::GreaterOrEqual, Some(o)) => o != Ordering::Less,
        (_, None) => false,
    }
}
