//! Rule evaluator

use crate::error::{Result, RuleError};
use crate::rule::ast::{AstNode, CompareOp, Comparison, Literal, Logic};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Field value supplied by the caller at evaluation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Number(v as f64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Number(v as f64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Number(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

/// Record a rule is evaluated against
pub type DataRecord = HashMap<String, Scalar>;

/// Evaluate a tree against a record.
///
/// Both sides of every operator are evaluated, so an error anywhere in the
/// tree is reported even when the other side already decides the result.
pub fn evaluate(node: &AstNode, data: &DataRecord) -> Result<bool> {
    match node {
        AstNode::Operand(cmp) => evaluate_comparison(cmp, data),
        AstNode::Operator { logic, left, right } => {
            let left = evaluate(left, data)?;
            let right = evaluate(right, data)?;
            Ok(match logic {
                Logic::And => left && right,
                Logic::Or => left || right,
            })
        }
    }
}

fn evaluate_comparison(cmp: &Comparison, data: &DataRecord) -> Result<bool> {
    let actual = data
        .get(&cmp.field)
        .ok_or_else(|| RuleError::MissingField(cmp.field.clone()))?;

    let lhs = Primitive::from(actual);
    let rhs = Primitive::from(&cmp.value);

    Ok(match cmp.operator {
        CompareOp::DoubleEqual | CompareOp::Equal => loose_eq(lhs, rhs),
        CompareOp::NotEqual => !loose_eq(lhs, rhs),
        CompareOp::Greater => matches!(relate(lhs, rhs), Some(Ordering::Greater)),
        CompareOp::Less => matches!(relate(lhs, rhs), Some(Ordering::Less)),
        CompareOp::GreaterEqual => {
            matches!(relate(lhs, rhs), Some(Ordering::Greater | Ordering::Equal))
        }
        CompareOp::LessEqual => {
            matches!(relate(lhs, rhs), Some(Ordering::Less | Ordering::Equal))
        }
    })
}

/// Borrowed view over data values and literals
#[derive(Debug, Clone, Copy)]
enum Primitive<'a> {
    Number(f64),
    Str(&'a str),
    Bool(bool),
}

impl<'a> From<&'a Scalar> for Primitive<'a> {
    fn from(v: &'a Scalar) -> Self {
        match v {
            Scalar::Boolean(b) => Primitive::Bool(*b),
            Scalar::Number(n) => Primitive::Number(*n),
            Scalar::String(s) => Primitive::Str(s),
        }
    }
}

impl<'a> From<&'a Literal> for Primitive<'a> {
    fn from(v: &'a Literal) -> Self {
        match v {
            Literal::Number(n) => Primitive::Number(*n),
            Literal::String(s) => Primitive::Str(s),
        }
    }
}

impl Primitive<'_> {
    fn to_number(self) -> f64 {
        match self {
            Primitive::Number(n) => n,
            Primitive::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Primitive::Str(s) => string_to_number(s),
        }
    }
}

/// Equality with numeric coercion for mixed types
fn loose_eq(a: Primitive<'_>, b: Primitive<'_>) -> bool {
    match (a, b) {
        (Primitive::Number(x), Primitive::Number(y)) => x == y,
        (Primitive::Str(x), Primitive::Str(y)) => x == y,
        (Primitive::Bool(x), Primitive::Bool(y)) => x == y,
        (Primitive::Number(n), Primitive::Str(s)) | (Primitive::Str(s), Primitive::Number(n)) => {
            n == string_to_number(s)
        }
        (Primitive::Bool(b), other) | (other, Primitive::Bool(b)) => {
            loose_eq(Primitive::Number(Primitive::Bool(b).to_number()), other)
        }
    }
}

/// Ordering for relational operators; `None` when either side is NaN
fn relate(a: Primitive<'_>, b: Primitive<'_>) -> Option<Ordering> {
    match (a, b) {
        (Primitive::Str(x), Primitive::Str(y)) => Some(x.cmp(y)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}

/// Numeric reading of a string: trimmed, empty is zero, anything that is not
/// a plain decimal, hex/octal/binary literal or `Infinity` is NaN.
fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }

    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // f64::from_str also accepts "inf"/"nan" spellings, which are not numbers here
    if t.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }

    t.parse::<f64>().unwrap_or(f64::NAN)
}
