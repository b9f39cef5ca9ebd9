//! Helpers for treating JSON values as numbers, booleans and typed operands

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// A number as the engine computes with it
///
/// Values `Decimal` holds exactly stay exact. Magnitudes beyond its range
/// (about 7.9e28) or with more than 28 fractional digits are floats, and so
/// is an exact result that overflows or underflows to zero.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Exact(Decimal),
    Float(f64),
}

impl Numeric {
    pub const ZERO: Numeric = Numeric::Exact(Decimal::ZERO);

    fn float(value: f64) -> Option<Numeric> {
        value.is_finite().then_some(Numeric::Float(value))
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Numeric::Exact(d) => d.to_f64().unwrap_or(f64::NAN),
            Numeric::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Numeric::Exact(d) => d.is_zero(),
            Numeric::Float(f) => f == 0.0,
        }
    }

    pub fn checked_add(self, other: Numeric) -> Option<Numeric> {
        self.combine(other, Decimal::checked_add, |a, b| a + b, false)
    }

    pub fn checked_sub(self, other: Numeric) -> Option<Numeric> {
        self.combine(other, Decimal::checked_sub, |a, b| a - b, false)
    }

    pub fn checked_mul(self, other: Numeric) -> Option<Numeric> {
        self.combine(other, Decimal::checked_mul, |a, b| a * b, true)
    }

    /// `None` on a zero divisor
    pub fn checked_div(self, other: Numeric) -> Option<Numeric> {
        if other.is_zero() {
            return None;
        }
        self.combine(other, Decimal::checked_div, |a, b| a / b, true)
    }

    /// `None` on a zero divisor
    pub fn checked_rem(self, other: Numeric) -> Option<Numeric> {
        if other.is_zero() {
            return None;
        }
        self.combine(other, Decimal::checked_rem, |a, b| a % b, false)
    }

    fn combine(
        self,
        other: Numeric,
        exact: fn(Decimal, Decimal) -> Option<Decimal>,
        float: fn(f64, f64) -> f64,
        rounds: bool,
    ) -> Option<Numeric> {
        if let (Numeric::Exact(a), Numeric::Exact(b)) = (self, other) {
            // Products and quotients that round away to zero fall through to floats
            match exact(a, b) {
                Some(d) if !rounds || !d.is_zero() || a.is_zero() || b.is_zero() => {
                    return Some(Numeric::Exact(d))
                }
                _ => {}
            }
        }
        Numeric::float(float(self.to_f64(), other.to_f64()))
    }

    pub fn abs(self) -> Numeric {
        match self {
            Numeric::Exact(d) => Numeric::Exact(d.abs()),
            Numeric::Float(f) => Numeric::Float(f.abs()),
        }
    }

    pub fn floor(self) -> Numeric {
        match self {
            Numeric::Exact(d) => Numeric::Exact(d.floor()),
            Numeric::Float(f) => Numeric::Float(f.floor()),
        }
    }

    pub fn ceil(self) -> Numeric {
        match self {
            Numeric::Exact(d) => Numeric::Exact(d.ceil()),
            Numeric::Float(f) => Numeric::Float(f.ceil()),
        }
    }

    /// Round half to even at `places` fractional digits
    pub fn round_dp(self, places: u32) -> Numeric {
        match self {
            Numeric::Exact(d) => {
                Numeric::Exact(d.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven))
            }
            // Floats are either huge, where rounding is a no-op, or tiny
            Numeric::Float(f) => {
                let scale = 10f64.powi(places.min(308) as i32);
                Numeric::float((f * scale).round_ties_even() / scale).unwrap_or(Numeric::Float(f))
            }
        }
    }

    /// Whole part as an integer, if it fits
    pub fn trunc_i64(self) -> Option<i64> {
        match self {
            Numeric::Exact(d) => d.trunc().to_i64(),
            Numeric::Float(f) => {
                let whole = f.trunc();
                (whole >= i64::MIN as f64 && whole < i64::MAX as f64).then_some(whole as i64)
            }
        }
    }

    /// Convert back into a JSON number
    ///
    /// Integral exact results become integers, everything else a float.
    pub fn into_value(self) -> Value {
        match self {
            Numeric::Exact(d) => from_decimal(d),
            Numeric::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        }
    }
}

impl From<Decimal> for Numeric {
    fn from(d: Decimal) -> Self {
        Numeric::Exact(d)
    }
}

impl From<usize> for Numeric {
    fn from(n: usize) -> Self {
        Numeric::Exact(Decimal::from(n))
    }
}

impl Neg for Numeric {
    type Output = Numeric;

    fn neg(self) -> Numeric {
        match self {
            Numeric::Exact(d) => Numeric::Exact(-d),
            Numeric::Float(f) => Numeric::Float(-f),
        }
    }
}

impl Ord for Numeric {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => a.cmp(b),
            _ => {
                let (a, b) = (self.to_f64(), other.to_f64());
                a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
            }
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Numeric {}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Exact(d) => write!(f, "{}", d.normalize()),
            Numeric::Float(x) => match Number::from_f64(*x) {
                Some(n) => write!(f, "{}", n),
                None => write!(f, "{}", x),
            },
        }
    }
}

/// Numeric view of a JSON number, without any string coercion
pub fn to_number(value: &Value) -> Option<Numeric> {
    match value {
        Value::Number(n) => number_to_numeric(n),
        _ => None,
    }
}

/// Numeric view of a JSON number or a numeric string
///
/// Booleans are never numeric.
pub fn coerce_number(value: &Value) -> Option<Numeric> {
    match value {
        Value::Number(n) => number_to_numeric(n),
        Value::String(s) => parse_number(s.trim()),
        _ => None,
    }
}

/// Parse a numeric literal, exactly when `Decimal` can hold it
pub(crate) fn parse_number(text: &str) -> Option<Numeric> {
    if text.is_empty() {
        return None;
    }
    let float = text.parse::<f64>().ok().filter(|f| f.is_finite());
    match parse_decimal(text) {
        Some(d) if float.map_or(true, |f| represents(d, f)) => Some(Numeric::Exact(d)),
        _ => float.map(Numeric::Float),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Whether a decimal parsed from text kept the magnitude of the float
fn represents(d: Decimal, float: f64) -> bool {
    let approx = d.to_f64().unwrap_or(f64::NAN);
    approx == float || (approx - float).abs() <= float.abs() * 1e-12
}

fn number_to_numeric(n: &Number) -> Option<Numeric> {
    if let Some(i) = n.as_i64() {
        return Some(Numeric::Exact(Decimal::from(i)));
    }
    if let Some(u) = n.as_u64() {
        return Some(Numeric::Exact(Decimal::from(u)));
    }
    parse_number(&n.to_string())
        .or_else(|| n.as_f64().and_then(|f| Decimal::from_f64(f).map(Numeric::Exact)))
}

/// Convert a computed decimal back into a JSON number
///
/// Integral results become integers, everything else a float.
pub fn from_decimal(d: Decimal) -> Value {
    let d = d.normalize();
    if d.scale() == 0 {
        if let Some(i) = d.to_i64() {
            return Value::from(i);
        }
    }
    d.to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| d.to_f64())
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

/// Truthiness used by the logical verbs
///
/// null, false, 0, "", [] and {} are false, everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => number_to_numeric(n).is_some_and(|n| !n.is_zero()),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(members) => !members.is_empty(),
    }
}

/// Structural equality where numbers compare by value, so 1 equals 1.0
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => to_number(left) == to_number(right),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l
                    .iter()
                    .all(|(key, a)| r.get(key).is_some_and(|b| values_equal(a, b)))
        }
        _ => left == right,
    }
}

/// Human-readable JSON type name for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
