//! Text functions

use super::{arg, lift_one, scalar_arg};
use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::resolver::coerce_to_text;
use crate::value::Value;

fn map_text(args: &[Value], ctx: &EvaluationContext, f: fn(String) -> Value) -> FormulaResult<Value> {
    lift_one(arg(args, 0), ctx, |v| coerce_to_text(v).map_or_else(Value::Error, f))
}

/// LEN(text)
pub fn fn_len(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    map_text(args, ctx, |s| Value::Number(s.chars().count() as f64))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    map_text(args, ctx, |s| Value::Text(s.to_lowercase()))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    map_text(args, ctx, |s| Value::Text(s.to_uppercase()))
}

/// CONCATENATE(text1, [text2], ...)
pub fn fn_concatenate(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let mut out = String::new();
    for arg in args {
        match scalar_arg(arg, ctx).and_then(|v| coerce_to_text(&v)) {
            Ok(s) => out.push_str(&s),
            Err(e) => return Ok(Value::Error(e)),
        }
    }
    Ok(Value::Text(out))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate_formula, EvaluationContext};
    use crate::value::Value;
    use sheetcalc_core::CellError;

    fn eval(formula: &str) -> Value {
        evaluate_formula(formula, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_len() {
        assert_eq!(eval("=LEN(\"Hello\")"), Value::Number(5.0));
        assert_eq!(eval("=LEN(\"Grüße\")"), Value::Number(5.0));
        assert_eq!(eval("=LEN(12.5)"), Value::Number(4.0));
        assert_eq!(eval("=LEN(A1)"), Value::Number(0.0));
        assert_eq!(eval("=LEN(NA())"), Value::Error(CellError::Na));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(eval("=UPPER(\"abc\")"), Value::text("ABC"));
        assert_eq!(eval("=LOWER(\"ÀBC\")"), Value::text("àbc"));
        assert_eq!(eval("=UPPER(TRUE)"), Value::text("TRUE"));
    }

    #[test]
    fn test_concatenate() {
        assert_eq!(
            eval("=CONCATENATE(\"a\",1,TRUE,A1)"),
            Value::text("a1TRUE")
        );
        assert_eq!(
            eval("=CONCATENATE(\"a\",1/0)"),
            Value::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_len_in_array_mode() {
        let ctx = EvaluationContext::simple().with_array_mode(true);
        let Value::Area(area) = evaluate_formula("=LEN({\"a\";\"abc\"})", &ctx).unwrap() else {
            panic!("expected an area");
        };
        assert_eq!(area.values(), &[Value::Number(1.0), Value::Number(3.0)][..]);
    }
}
