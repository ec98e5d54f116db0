//! Logical functions

use super::{arg, reference_cells, scalar_arg};
use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::resolver::coerce_to_boolean;
use crate::value::Value;
use sheetcalc_core::CellError;

/// IF function
///
/// `IF(A1,,1)` returns a blank for the omitted branch; leaving the third argument
/// off entirely returns FALSE.
pub fn fn_if(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let condition = match scalar_arg(arg(args, 0), ctx).and_then(|v| coerce_to_boolean(&v, false)) {
        Ok(b) => b,
        Err(e) => return Ok(Value::Error(e)),
    };

    let branch = if condition {
        arg(args, 1)
    } else if args.len() < 3 {
        return Ok(Value::Boolean(false));
    } else {
        arg(args, 2)
    };

    Ok(match branch {
        Value::MissingArgument => Value::Blank,
        other => other.clone(),
    })
}

/// Fold the logical values of every argument
///
/// Direct arguments must coerce to a boolean; inside references, text and blanks
/// are skipped. No logical values at all is `#VALUE!`.
fn fold_logical(
    args: &[Value],
    ctx: &EvaluationContext,
    init: bool,
    f: fn(bool, bool) -> bool,
) -> Result<bool, CellError> {
    let mut result = init;
    let mut seen = false;

    for arg in args {
        if let Some(cells) = reference_cells(arg) {
            for cell in cells {
                match cell {
                    Value::Boolean(b) => {
                        result = f(result, *b);
                        seen = true;
                    }
                    Value::Number(n) => {
                        result = f(result, *n != 0.0);
                        seen = true;
                    }
                    Value::Error(e) => return Err(*e),
                    _ => {}
                }
            }
            continue;
        }

        let value = scalar_arg(arg, ctx)?;
        if matches!(value, Value::MissingArgument) {
            continue;
        }
        result = f(result, coerce_to_boolean(&value, false)?);
        seen = true;
    }

    if seen {
        Ok(result)
    } else {
        Err(CellError::Value)
    }
}

/// AND function
pub fn fn_and(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(fold_logical(args, ctx, true, |a, b| a && b).map_or_else(Value::Error, Value::Boolean))
}

/// OR function
pub fn fn_or(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(fold_logical(args, ctx, false, |a, b| a || b).map_or_else(Value::Error, Value::Boolean))
}

/// NOT function
pub fn fn_not(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(scalar_arg(arg(args, 0), ctx)
        .and_then(|v| coerce_to_boolean(&v, false))
        .map_or_else(Value::Error, |b| Value::Boolean(!b)))
}

/// IFERROR(value, value_if_error) - Returns value_if_error if value is an error, otherwise returns value
pub fn fn_iferror(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let value = arg(args, 0);

    match scalar_arg(value, ctx) {
        Err(_) => Ok(match arg(args, 1) {
            Value::MissingArgument => Value::Blank,
            fallback => fallback.clone(),
        }),
        Ok(_) => Ok(value.clone()),
    }
}

pub fn fn_true(_args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(true))
}

pub fn fn_false(_args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Boolean(false))
}
