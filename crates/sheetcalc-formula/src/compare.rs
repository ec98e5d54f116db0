//! Mixed-type value ordering and the relational operators
//!
//! Blanks compare as zero with numbers and as the empty string with text. Otherwise
//! numbers sort below text, and text sorts below booleans.

use crate::error::{FormulaError, FormulaResult};
use crate::resolver::resolve_single_value;
use crate::value::Value;
use std::cmp::Ordering;

/// Compare two resolved values
///
/// Errors, areas, unions and NaN are outside the ordering and produce
/// [`FormulaError::InvalidArgument`]; resolve operands first.
pub fn compare(a: &Value, b: &Value) -> FormulaResult<Ordering> {
    match (a, b) {
        (Value::Blank | Value::MissingArgument, other) => compare_blank(other),
        (other, Value::Blank | Value::MissingArgument) => compare_blank(other).map(Ordering::reverse),

        (Value::Boolean(x), Value::Boolean(y)) => Ok(x.cmp(y)),
        (Value::Boolean(_), other) if is_ordered(other) => Ok(Ordering::Greater),
        (other, Value::Boolean(_)) if is_ordered(other) => Ok(Ordering::Less),

        (Value::Text(x), Value::Text(y)) => Ok(compare_text(x, y)),
        (Value::Text(_), Value::Number(n)) if !n.is_nan() => Ok(Ordering::Greater),
        (Value::Number(n), Value::Text(_)) if !n.is_nan() => Ok(Ordering::Less),

        (Value::Number(x), Value::Number(y)) => compare_numbers(*x, *y),

        _ => Err(unordered(a, b)),
    }
}

/// Where a blank sorts relative to `other`
fn compare_blank(other: &Value) -> FormulaResult<Ordering> {
    match other {
        Value::Blank | Value::MissingArgument => Ok(Ordering::Equal),
        Value::Boolean(true) => Ok(Ordering::Less),
        Value::Boolean(false) => Ok(Ordering::Equal),
        Value::Number(n) => compare_numbers(0.0, *n),
        Value::Text(s) if s.is_empty() => Ok(Ordering::Equal),
        Value::Text(_) => Ok(Ordering::Less),
        _ => Err(unordered(&Value::Blank, other)),
    }
}

fn is_ordered(value: &Value) -> bool {
    match value {
        Value::Number(n) => !n.is_nan(),
        Value::Text(_) | Value::Boolean(_) => true,
        _ => false,
    }
}

// `==` on floats already treats -0.0 and 0.0 as equal
fn compare_numbers(x: f64, y: f64) -> FormulaResult<Ordering> {
    x.partial_cmp(&y)
        .ok_or_else(|| unordered(&Value::Number(x), &Value::Number(y)))
}

fn compare_text(x: &str, y: &str) -> Ordering {
    let fold = |s: &str| {
        s.chars()
            .flat_map(char::to_uppercase)
            .flat_map(char::to_lowercase)
            .collect::<Vec<_>>()
    };
    if x.len() == y.len() && x.eq_ignore_ascii_case(y) {
        return Ordering::Equal;
    }
    fold(x).cmp(&fold(y))
}

fn unordered(a: &Value, b: &Value) -> FormulaError {
    FormulaError::InvalidArgument {
        operation: "compare",
        detail: format!("cannot order {} against {}", a.type_name(), b.type_name()),
    }
}

/// The six comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl RelationalOperator {
    /// Whether a comparison outcome satisfies this operator
    pub fn test(self, ordering: Ordering) -> bool {
        match self {
            RelationalOperator::Equal => ordering == Ordering::Equal,
            RelationalOperator::NotEqual => ordering != Ordering::Equal,
            RelationalOperator::LessThan => ordering == Ordering::Less,
            RelationalOperator::LessEqual => ordering != Ordering::Greater,
            RelationalOperator::GreaterThan => ordering == Ordering::Greater,
            RelationalOperator::GreaterEqual => ordering != Ordering::Less,
        }
    }

    /// Compare two operands as seen from (`row`, `col`)
    ///
    /// An error in either operand is the result, the left one first.
    pub fn evaluate(self, a: &Value, b: &Value, row: u32, col: u16) -> FormulaResult<Value> {
        let a = match resolve_single_value(a, row, col) {
            Ok(v) => v,
            Err(e) => return Ok(Value::Error(e)),
        };
        let b = match resolve_single_value(b, row, col) {
            Ok(v) => v,
            Err(e) => return Ok(Value::Error(e)),
        };
        Ok(Value::Boolean(self.test(compare(&a, &b)?)))
    }

    /// Operator text as written in a formula
    pub fn symbol(self) -> &'static str {
        match self {
            RelationalOperator::Equal => "=",
            RelationalOperator::NotEqual => "<>",
            RelationalOperator::LessThan => "<",
            RelationalOperator::LessEqual => "<=",
            RelationalOperator::GreaterThan => ">",
            RelationalOperator::GreaterEqual => ">=",
        }
    }
}
