//! Arithmetic, unary and concatenation operators on scalar operands

use crate::resolver::{coerce_to_double, coerce_to_text, resolve_single_value};
use crate::value::Value;
use sheetcalc_core::CellError;

/// Raise `base` to `exponent`
///
/// A negative base with an exponent strictly between -1 and 1 is treated as an odd
/// root, so `power(-27.0, 1.0 / 3.0)` is `-3.0` rather than NaN.
pub fn power(base: f64, exponent: f64) -> f64 {
    if base < 0.0 && exponent.abs() > 0.0 && exponent.abs() < 1.0 {
        -((-base).powf(exponent))
    } else {
        base.powf(exponent)
    }
}

/// Binary numeric operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl NumericOperator {
    /// Apply the operator to two numbers
    pub fn apply(self, d0: f64, d1: f64) -> Result<f64, CellError> {
        match self {
            NumericOperator::Add => Ok(d0 + d1),
            NumericOperator::Subtract => Ok(d0 - d1),
            NumericOperator::Multiply => Ok(d0 * d1),
            NumericOperator::Divide if d1 == 0.0 => Err(CellError::Div0),
            NumericOperator::Divide => Ok(d0 / d1),
            NumericOperator::Power => Ok(power(d0, d1)),
        }
    }

    /// Evaluate the operator on two operands as seen from (`row`, `col`)
    ///
    /// Errors short-circuit, the left operand first. A NaN or infinite result is
    /// `#NUM!`. Zero results are reported as `+0.0`, except for subtraction.
    pub fn evaluate(self, a: &Value, b: &Value, row: u32, col: u16) -> Value {
        match self.evaluate_number(a, b, row, col) {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }

    fn evaluate_number(self, a: &Value, b: &Value, row: u32, col: u16) -> Result<f64, CellError> {
        let d0 = coerce_to_double(&resolve_single_value(a, row, col)?)?;
        let d1 = coerce_to_double(&resolve_single_value(b, row, col)?)?;
        let result = self.apply(d0, d1)?;
        if !result.is_finite() {
            return Err(CellError::Num);
        }
        if result == 0.0 && self != NumericOperator::Subtract {
            return Ok(0.0);
        }
        Ok(result)
    }

    /// Operator text as written in a formula
    pub fn symbol(self) -> &'static str {
        match self {
            NumericOperator::Add => "+",
            NumericOperator::Subtract => "-",
            NumericOperator::Multiply => "*",
            NumericOperator::Divide => "/",
            NumericOperator::Power => "^",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Negation (-)
    Negate,
    /// Unary plus (+), returns the operand unchanged
    Plus,
    /// Percent (%), divides by 100
    Percent,
}

impl UnaryOperator {
    /// Evaluate the operator on one operand as seen from (`row`, `col`)
    pub fn evaluate(self, arg: &Value, row: u32, col: u16) -> Value {
        let value = match resolve_single_value(arg, row, col) {
            Ok(v) => v,
            Err(e) => return Value::Error(e),
        };
        if self == UnaryOperator::Plus {
            return value;
        }
        match coerce_to_double(&value) {
            Ok(n) if self == UnaryOperator::Negate => Value::Number(-n),
            Ok(n) => Value::Number(n / 100.0),
            Err(e) => Value::Error(e),
        }
    }
}

/// Text concatenation (`&`) as seen from (`row`, `col`)
pub fn concat(a: &Value, b: &Value, row: u32, col: u16) -> Value {
    let text = |v: &Value| resolve_single_value(v, row, col).and_then(|v| coerce_to_text(&v));
    match (text(a), text(b)) {
        (Ok(x), Ok(y)) => Value::Text(x + &y),
        (Err(e), _) | (_, Err(e)) => Value::Error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Area;

    #[test]
    fn test_power() {
        assert_eq!(power(9.0, 2.0), 81.0);
        assert_eq!(power(-27.0, 1.0 / 3.0), -3.0);
        assert_eq!(power(-8.0, -1.0 / 3.0), -0.5);
        assert_eq!(power(-2.0, 3.0), -8.0);
        assert_eq!(power(-2.0, 0.0), 1.0);
        assert!(power(-1.00001, 1.1).is_nan());
    }

    #[test]
    fn test_power_operator_maps_nan_to_num() {
        let result =
            NumericOperator::Power.evaluate(&Value::Number(-1.00001), &Value::Number(1.1), 0, 0);
        assert_eq!(result, Value::Error(CellError::Num));
    }

    #[test]
    fn test_overflow_is_num() {
        let result =
            NumericOperator::Multiply.evaluate(&Value::Number(1e200), &Value::Number(1e200), 0, 0);
        assert_eq!(result, Value::Error(CellError::Num));
    }

    #[test]
    fn test_divide_by_zero() {
        let result = NumericOperator::Divide.evaluate(&Value::Number(1.0), &Value::Blank, 0, 0);
        assert_eq!(result, Value::Error(CellError::Div0));
    }

    #[test]
    fn test_operands_are_coerced() {
        let result =
            NumericOperator::Add.evaluate(&Value::text("2"), &Value::Boolean(true), 0, 0);
        assert_eq!(result, Value::Number(3.0));

        let result = NumericOperator::Add.evaluate(&Value::text("two"), &Value::Number(1.0), 0, 0);
        assert_eq!(result, Value::Error(CellError::Value));
    }

    #[test]
    fn test_left_error_wins() {
        let result = NumericOperator::Add.evaluate(
            &Value::Error(CellError::Na),
            &Value::Error(CellError::Div0),
            0,
            0,
        );
        assert_eq!(result, Value::Error(CellError::Na));
    }

    #[test]
    fn test_zero_results_are_positive() {
        let Value::Number(n) =
            NumericOperator::Multiply.evaluate(&Value::Number(-1.0), &Value::Number(0.0), 0, 0)
        else {
            panic!("expected a number");
        };
        assert!(n.is_sign_positive());

        let Value::Number(n) =
            NumericOperator::Subtract.evaluate(&Value::Number(-0.0), &Value::Number(0.0), 0, 0)
        else {
            panic!("expected a number");
        };
        assert!(n.is_sign_negative());
    }

    #[test]
    fn test_operands_use_implicit_intersection() {
        let column = Value::Area(
            Area::new(0, 0, vec![vec![Value::Number(-27.0)], vec![Value::Number(8.0)]]).unwrap(),
        );
        let third = Value::Number(1.0 / 3.0);
        assert_eq!(
            NumericOperator::Power.evaluate(&column, &third, 0, 5),
            Value::Number(-3.0)
        );
        assert_eq!(
            NumericOperator::Power.evaluate(&column, &third, 1, 5),
            Value::Number(2.0)
        );
        assert_eq!(
            NumericOperator::Power.evaluate(&column, &third, 2, 5),
            Value::Error(CellError::Value)
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            UnaryOperator::Negate.evaluate(&Value::Number(5.0), 0, 0),
            Value::Number(-5.0)
        );
        assert_eq!(
            UnaryOperator::Percent.evaluate(&Value::text("50"), 0, 0),
            Value::Number(0.5)
        );
        assert_eq!(
            UnaryOperator::Plus.evaluate(&Value::text("abc"), 0, 0),
            Value::text("abc")
        );
        assert_eq!(
            UnaryOperator::Negate.evaluate(&Value::Error(CellError::Ref), 0, 0),
            Value::Error(CellError::Ref)
        );
    }

    #[test]
    fn test_concat() {
        assert_eq!(
            concat(&Value::text("a"), &Value::Number(1.5), 0, 0),
            Value::text("a1.5")
        );
        assert_eq!(
            concat(&Value::Boolean(true), &Value::Blank, 0, 0),
            Value::text("TRUE")
        );
        assert_eq!(
            concat(&Value::text("a"), &Value::Error(CellError::Na), 0, 0),
            Value::Error(CellError::Na)
        );
    }
}
