use super::VerbError;
use crate::value::{coerce_number, is_truthy, values_equal};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterThan,
    LessThan,
    Equal,
    NotEqual,
}

impl Comparison {
    /// Ordering comparisons require both operands to be numeric (numbers or
    /// numeric strings). Equality compares numerically when both sides are
    /// numeric and structurally otherwise.
    pub fn apply(&self, left: &Value, right: &Value) -> Result<bool, VerbError> {
        match self {
            Comparison::GreaterThan | Comparison::LessThan => {
                let l = coerce_number(left).ok_or_else(|| VerbError::type_conversion("a number", left))?;
                let r = coerce_number(right).ok_or_else(|| VerbError::type_conversion("a number", right))?;
                Ok(if *self == Comparison::GreaterThan { l > r } else { l < r })
            }
            Comparison::Equal => Ok(loosely_equal(left, right)),
            Comparison::NotEqual => Ok(!loosely_equal(left, right)),
        }
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (coerce_number(left), coerce_number(right)) {
        (Some(l), Some(r)) => l == r,
        _ => values_equal(left, right),
    }
}

/// Equality without any coercion between types
pub(super) fn identical(left: &Value, right: &Value) -> bool {
    values_equal(left, right)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    And,
    Or,
}

impl Logical {
    pub fn apply(&self, left: &Value, right: &Value) -> bool {
        match self {
            Logical::And => is_truthy(left) && is_truthy(right),
            Logical::Or => is_truthy(left) || is_truthy(right),
        }
    }
}
