use super::eval::{number_operand, truthy, Output};
use crate::query::QueryError;
use crate::value::{parse_number, to_number, Numeric};
use serde_json::Value;

/// Invoke a built-in function by name (without the `$`)
pub(super) fn call(name: &str, args: Vec<Output>) -> Result<Output, QueryError> {
    match name {
        "sum" => {
            let numbers = numbers(name, &single(name, args)?.into_items())?;
            let total = numbers
                .into_iter()
                .try_fold(Numeric::ZERO, |acc, n| acc.checked_add(n))
                .ok_or_else(|| QueryError::Evaluation("$sum overflowed".to_string()))?;
            Ok(Output::Single(total.into_value()))
        }
        "count" => {
            let count = single(name, args)?.into_items().len();
            Ok(Output::Single(Value::from(count)))
        }
        "max" | "min" => {
            let items = single(name, args)?.into_items();
            let numbers = numbers(name, &items)?;
            let chosen = numbers
                .iter()
                .enumerate()
                .reduce(|best, candidate| {
                    let better = if name == "max" {
                        candidate.1 > best.1
                    } else {
                        candidate.1 < best.1
                    };
                    if better {
                        candidate
                    } else {
                        best
                    }
                })
                .map(|(position, _)| position);
            Ok(chosen.map_or(Output::Undefined, |position| {
                Output::Single(items[position].clone())
            }))
        }
        "average" => {
            let numbers = numbers(name, &single(name, args)?.into_items())?;
            if numbers.is_empty() {
                return Ok(Output::Undefined);
            }
            let total = numbers
                .iter()
                .try_fold(Numeric::ZERO, |acc, n| acc.checked_add(*n))
                .ok_or_else(|| QueryError::Evaluation("$average overflowed".to_string()))?;
            let mean = total
                .checked_div(Numeric::from(numbers.len()))
                .ok_or_else(|| QueryError::Evaluation("$average overflowed".to_string()))?;
            Ok(Output::Single(mean.into_value()))
        }
        "exists" => Ok(boolean(!single(name, args)?.is_undefined())),
        "boolean" => {
            let arg = single(name, args)?;
            if arg.is_undefined() {
                return Ok(Output::Undefined);
            }
            Ok(boolean(truthy(&arg)))
        }
        "not" => {
            let arg = single(name, args)?;
            if arg.is_undefined() {
                return Ok(Output::Undefined);
            }
            Ok(boolean(!truthy(&arg)))
        }
        "string" => Ok(match single(name, args)?.into_value() {
            None => Output::Undefined,
            Some(value) => Output::Single(Value::String(stringify(&value))),
        }),
        "number" => match single(name, args)?.into_value() {
            None => Ok(Output::Undefined),
            Some(Value::Number(n)) => Ok(Output::Single(Value::Number(n))),
            Some(Value::Bool(b)) => Ok(Output::Single(Value::from(u8::from(b)))),
            Some(Value::String(text)) => parse_number(text.trim())
                .map(|n| Output::Single(n.into_value()))
                .ok_or_else(|| {
                    QueryError::Evaluation(format!("unable to cast '{}' to a number", text))
                }),
            Some(other) => Err(QueryError::Evaluation(format!(
                "unable to cast {} to a number",
                other
            ))),
        },
        "length" => match single(name, args)?.into_value() {
            None => Ok(Output::Undefined),
            Some(Value::String(text)) => Ok(Output::Single(Value::from(text.chars().count()))),
            Some(other) => Err(argument_error(name, "a string", &other)),
        },
        "uppercase" | "lowercase" => match single(name, args)?.into_value() {
            None => Ok(Output::Undefined),
            Some(Value::String(text)) => Ok(Output::Single(Value::String(if name == "uppercase" {
                text.to_uppercase()
            } else {
                text.to_lowercase()
            }))),
            Some(other) => Err(argument_error(name, "a string", &other)),
        },
        "abs" | "floor" | "ceil" => {
            let arg = single(name, args)?;
            if arg.is_undefined() {
                return Ok(Output::Undefined);
            }
            let n = number_operand(arg, name)?;
            let result = match name {
                "abs" => n.abs(),
                "floor" => n.floor(),
                _ => n.ceil(),
            };
            Ok(Output::Single(result.into_value()))
        }
        "round" => {
            let mut args = args.into_iter();
            let (value, precision) = match (args.next(), args.next(), args.next()) {
                (Some(value), precision, None) => (value, precision),
                _ => return Err(arity_error(name)),
            };
            if value.is_undefined() {
                return Ok(Output::Undefined);
            }
            let n = number_operand(value, name)?;
            let places = match precision {
                None | Some(Output::Undefined) => 0,
                Some(p) => {
                    let p = number_operand(p, name)?;
                    p.trunc_i64().and_then(|p| u32::try_from(p).ok()).ok_or_else(|| {
                        QueryError::Evaluation(
                            "$round precision must be a non-negative integer".to_string(),
                        )
                    })?
                }
            };
            Ok(Output::Single(n.round_dp(places).into_value()))
        }
        "join" => {
            let mut args = args.into_iter();
            let (values, separator) = match (args.next(), args.next(), args.next()) {
                (Some(values), separator, None) => (values, separator),
                _ => return Err(arity_error(name)),
            };
            let separator = match separator.and_then(Output::into_value) {
                None => String::new(),
                Some(Value::String(s)) => s,
                Some(other) => return Err(argument_error(name, "a string separator", &other)),
            };
            let parts = values
                .into_items()
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(argument_error(name, "an array of strings", &other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Output::Single(Value::String(parts.join(&separator))))
        }
        "keys" => {
            let mut keys: Vec<Value> = Vec::new();
            for item in single(name, args)?.into_items() {
                if let Value::Object(members) = item {
                    for key in members.keys() {
                        let key = Value::String(key.clone());
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                }
            }
            Ok(Output::from_items(keys))
        }
        _ => Err(QueryError::Evaluation(format!("unknown function ${}", name))),
    }
}

fn single(name: &str, args: Vec<Output>) -> Result<Output, QueryError> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(arity_error(name)),
    }
}

fn numbers(name: &str, items: &[Value]) -> Result<Vec<Numeric>, QueryError> {
    items
        .iter()
        .map(|item| to_number(item).ok_or_else(|| argument_error(name, "an array of numbers", item)))
        .collect()
}

fn boolean(value: bool) -> Output {
    Output::Single(Value::Bool(value))
}

fn arity_error(name: &str) -> QueryError {
    QueryError::Evaluation(format!("argument count mismatch for function ${}", name))
}

fn argument_error(name: &str, expected: &str, got: &Value) -> QueryError {
    QueryError::Evaluation(format!(
        "argument of function ${} must be {}, got {}",
        name, expected, got
    ))
}

/// String form used by `$string` and the `&` operator
pub(super) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(_) => to_number(value)
            .map(|n| n.to_string())
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}
