//! Information functions
//!
//! All of these look at one value, so in array mode they run cell by cell.

use super::{arg, lift_one};
use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::value::Value;
use sheetcalc_core::CellError;

fn test_value(args: &[Value], ctx: &EvaluationContext, f: fn(&Value) -> bool) -> FormulaResult<Value> {
    lift_one(arg(args, 0), ctx, |v| Value::Boolean(f(v)))
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    test_value(args, ctx, |v| matches!(v, Value::Blank))
}

/// ISERROR(value)
pub fn fn_iserror(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    test_value(args, ctx, Value::is_error)
}

/// ISERR(value) - any error except #N/A
pub fn fn_iserr(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    test_value(args, ctx, |v| {
        matches!(v, Value::Error(e) if *e != CellError::Na)
    })
}

/// ISNA(value)
pub fn fn_isna(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    test_value(args, ctx, |v| matches!(v, Value::Error(CellError::Na)))
}

/// ISNUMBER(value)
pub fn fn_isnumber(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    test_value(args, ctx, |v| matches!(v, Value::Number(_)))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    test_value(args, ctx, |v| matches!(v, Value::Text(_)))
}

/// ISLOGICAL(value)
pub fn fn_islogical(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    test_value(args, ctx, |v| matches!(v, Value::Boolean(_)))
}

/// NA()
pub fn fn_na(_args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Error(CellError::Na))
}
