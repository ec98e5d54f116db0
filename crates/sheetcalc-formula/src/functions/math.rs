//! Math functions

use super::{arg, lift_one, number_arg, number_result, reference_cells, scalar_arg};
use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::operators::NumericOperator;
use crate::resolver::coerce_to_double;
use crate::value::Value;
use sheetcalc_core::CellError;

/// Numbers from a list of arguments, the way SUM and PRODUCT see them
///
/// Values typed directly into the call are coerced, so `"2"` and `TRUE` count.
/// Inside a reference only numbers count. Any error stops the scan.
fn collect_numbers(args: &[Value], ctx: &EvaluationContext) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();

    for arg in args {
        if let Some(cells) = reference_cells(arg) {
            for cell in cells {
                match cell {
                    Value::Number(n) => numbers.push(*n),
                    Value::Error(e) => return Err(*e),
                    _ => {} // Ignore non-numeric
                }
            }
            continue;
        }
        numbers.push(coerce_to_double(&scalar_arg(arg, ctx)?)?);
    }

    Ok(numbers)
}

/// SUM function
pub fn fn_sum(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(number_result(
        collect_numbers(args, ctx).map(|numbers| numbers.iter().sum()),
    ))
}

/// PRODUCT function
pub fn fn_product(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(number_result(collect_numbers(args, ctx).map(|numbers| {
        if numbers.is_empty() {
            0.0
        } else {
            numbers.iter().product()
        }
    })))
}

/// ABS function
pub fn fn_abs(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    lift_one(arg(args, 0), ctx, |v| {
        number_result(coerce_to_double(v).map(f64::abs))
    })
}

/// POWER(number, power), the same as `number^power`
pub fn fn_power(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(NumericOperator::Power.evaluate(
        arg(args, 0),
        arg(args, 1),
        ctx.current_row,
        ctx.current_col,
    ))
}

/// MOD(number, divisor), the remainder with the sign of the divisor
pub fn fn_mod(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let n = match number_arg(arg(args, 0), ctx) {
        Ok(n) => n,
        Err(e) => return Ok(Value::Error(e)),
    };
    let d = match number_arg(arg(args, 1), ctx) {
        Ok(d) => d,
        Err(e) => return Ok(Value::Error(e)),
    };

    if d == 0.0 {
        return Ok(Value::Error(CellError::Div0));
    }
    Ok(number_result(Ok(n - d * (n / d).floor())))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate_formula, EvaluationContext};
    use crate::value::Value;
    use sheetcalc_core::{CellError, CellValue, Workbook};

    fn eval(formula: &str) -> Value {
        evaluate_formula(formula, &EvaluationContext::simple()).unwrap()
    }

    fn workbook() -> Workbook {
        let mut workbook = Workbook::new();
        let sheet = workbook.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_value("A2", "2").unwrap();
        sheet.set_cell_value("A3", true).unwrap();
        sheet.set_cell_value("A4", 4.0).unwrap();
        sheet
            .set_cell_value_at(4, 0, CellValue::Error(CellError::Na))
            .unwrap();
        workbook
    }

    #[test]
    fn test_sum() {
        assert_eq!(eval("=SUM(1,2,3)"), Value::Number(6.0));
        assert_eq!(eval("=SUM(\"2\",TRUE)"), Value::Number(3.0));
        assert_eq!(eval("=SUM(\"two\")"), Value::Error(CellError::Value));
        assert_eq!(eval("=SUM({1,2;3,4})"), Value::Number(10.0));
    }

    #[test]
    fn test_sum_skips_text_in_references() {
        let workbook = workbook();
        let ctx = EvaluationContext::new(Some(&workbook), 0, 0, 1);
        assert_eq!(evaluate_formula("=SUM(A1:A4)", &ctx).unwrap(), Value::Number(5.0));
        assert_eq!(
            evaluate_formula("=SUM(A1:A5)", &ctx).unwrap(),
            Value::Error(CellError::Na)
        );
        assert_eq!(
            evaluate_formula("=SUM((A1,A4),A4)", &ctx).unwrap(),
            Value::Number(9.0)
        );
    }

    #[test]
    fn test_product() {
        assert_eq!(eval("=PRODUCT(2,3,4)"), Value::Number(24.0));
        assert_eq!(eval("=PRODUCT(1e200,1e200)"), Value::Error(CellError::Num));
    }

    #[test]
    fn test_abs() {
        assert_eq!(eval("=ABS(-5)"), Value::Number(5.0));
        assert_eq!(eval("=ABS(\"x\")"), Value::Error(CellError::Value));
    }

    #[test]
    fn test_abs_broadcasts_in_array_mode() {
        let ctx = EvaluationContext::simple().with_array_mode(true);
        let Value::Area(area) = evaluate_formula("=ABS({-1,2,-3})", &ctx).unwrap() else {
            panic!("expected an area");
        };
        assert_eq!(
            area.values(),
            &[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)][..]
        );
    }

    #[test]
    fn test_power_function() {
        assert_eq!(eval("=POWER(2,10)"), Value::Number(1024.0));
        assert_eq!(eval("=POWER(-27,1/3)"), Value::Number(-3.0));
        assert_eq!(eval("=POWER(0,-1)"), Value::Error(CellError::Num));
    }

    #[test]
    fn test_mod() {
        assert_eq!(eval("=MOD(10,3)"), Value::Number(1.0));
        assert_eq!(eval("=MOD(-10,3)"), Value::Number(2.0));
        assert_eq!(eval("=MOD(10,-3)"), Value::Number(-2.0));
        assert_eq!(eval("=MOD(1,0)"), Value::Error(CellError::Div0));
    }
}
