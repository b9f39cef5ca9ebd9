use super::VerbError;
use crate::value::{to_number, Numeric};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Len,
    Sum,
    Min,
    Max,
    Mean,
    Median,
}

impl Aggregate {
    pub fn apply(&self, subject: &Value) -> Result<Value, VerbError> {
        if let Aggregate::Len = self {
            return match subject {
                Value::Array(items) => Ok(Value::from(items.len())),
                Value::String(text) => Ok(Value::from(text.chars().count())),
                Value::Object(members) => Ok(Value::from(members.len())),
                other => Err(VerbError::type_conversion("a list", other)),
            };
        }

        let Value::Array(items) = subject else {
            return Err(VerbError::type_conversion("a list", subject));
        };
        let numbers = items
            .iter()
            .map(|item| to_number(item).ok_or_else(|| VerbError::type_conversion("a number", item)))
            .collect::<Result<Vec<_>, _>>()?;

        match self {
            Aggregate::Sum => sum(&numbers).map(Numeric::into_value),
            _ if numbers.is_empty() => Err(VerbError::EmptyList),
            Aggregate::Min | Aggregate::Max => {
                let mut best = 0;
                for (position, n) in numbers.iter().enumerate() {
                    let better = if *self == Aggregate::Min {
                        *n < numbers[best]
                    } else {
                        *n > numbers[best]
                    };
                    if better {
                        best = position;
                    }
                }
                Ok(items[best].clone())
            }
            Aggregate::Mean => {
                let total = sum(&numbers)?;
                divide(total, Numeric::from(numbers.len())).map(Numeric::into_value)
            }
            Aggregate::Median => {
                let mut sorted = numbers;
                sorted.sort();
                let middle = sorted.len() / 2;
                if sorted.len() % 2 == 1 {
                    Ok(sorted[middle].into_value())
                } else {
                    let total = sum(&sorted[middle - 1..=middle])?;
                    divide(total, Numeric::from(2usize)).map(Numeric::into_value)
                }
            }
            Aggregate::Len => Ok(Value::from(items.len())),
        }
    }
}

fn sum(numbers: &[Numeric]) -> Result<Numeric, VerbError> {
    let mut total = Numeric::ZERO;
    for n in numbers {
        total = total
            .checked_add(*n)
            .ok_or_else(|| VerbError::type_conversion("numbers with a finite sum", &n.into_value()))?;
    }
    Ok(total)
}

fn divide(numerator: Numeric, denominator: Numeric) -> Result<Numeric, VerbError> {
    numerator
        .checked_div(denominator)
        .ok_or_else(|| VerbError::type_conversion("a non-zero divisor", &denominator.into_value()))
}

/// Pairwise division of two lists, stopping at the end of the shorter one
pub(super) fn list_divide(numerators: &Value, denominators: &Value) -> Result<Value, VerbError> {
    let (Value::Array(left), Value::Array(right)) = (numerators, denominators) else {
        let offender = if numerators.is_array() { denominators } else { numerators };
        return Err(VerbError::type_conversion("a list", offender));
    };
    left.iter()
        .zip(right)
        .map(|(n, d)| {
            let n = to_number(n).ok_or_else(|| VerbError::type_conversion("a number", n))?;
            let d = to_number(d).ok_or_else(|| VerbError::type_conversion("a number", d))?;
            divide(n, d).map(Numeric::into_value)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
