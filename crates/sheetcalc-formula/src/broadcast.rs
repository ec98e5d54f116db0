//! Element-wise lifting of scalar operations over areas
//!
//! Each argument is viewed as a grid with its own origin: an area keeps its
//! extents, anything else counts as a single cell. The result is as tall as the
//! tallest argument and as wide as the widest. Every output cell resolves each
//! argument at the matching offset from that argument's origin, so single rows and
//! columns are repeated along the missing dimension and cells past the edge of a
//! smaller 2-D area are `#VALUE!`.

use crate::error::FormulaResult;
use crate::resolver::resolve_single_value;
use crate::value::{Area, Value, MAX_ARRAY_CELLS};
use log::{trace, warn};
use sheetcalc_core::CellError;

#[derive(Debug, Clone, Copy)]
struct Extent {
    first_row: u32,
    first_col: u16,
    height: u32,
    width: u16,
}

impl Extent {
    fn of(arg: &Value, row: u32, col: u16) -> Self {
        match arg {
            Value::Area(area) => Extent {
                first_row: area.first_row(),
                first_col: area.first_column(),
                height: area.height(),
                width: area.width(),
            },
            _ => Extent {
                first_row: row,
                first_col: col,
                height: 1,
                width: 1,
            },
        }
    }

    fn resolve(&self, arg: &Value, i: u32, j: u16) -> Result<Value, CellError> {
        let row = self.first_row.checked_add(i).ok_or(CellError::Value)?;
        let col = self.first_col.checked_add(j).ok_or(CellError::Value)?;
        resolve_single_value(arg, row, col)
    }
}

/// Lift a two-operand scalar operation over its arguments
///
/// `f` only sees resolved, non-error scalars; an operand that resolves to an error
/// becomes that output cell's value, checking the left operand first. A single
/// result cell is returned as a scalar, anything larger as an area anchored at
/// (`row`, `col`). Only a [`FormulaError`](crate::FormulaError) from `f` stops the loop.
pub fn evaluate_two_array_args<F>(
    arg0: &Value,
    arg1: &Value,
    row: u32,
    col: u16,
    mut f: F,
) -> FormulaResult<Value>
where
    F: FnMut(&Value, &Value) -> FormulaResult<Value>,
{
    let e0 = Extent::of(arg0, row, col);
    let e1 = Extent::of(arg1, row, col);
    let height = e0.height.max(e1.height);
    let width = e0.width.max(e1.width);
    trace!("broadcasting two arguments over {}x{}", height, width);

    collect(row, col, height, width, |i, j| {
        let a = match e0.resolve(arg0, i, j) {
            Ok(v) => v,
            Err(e) => return Ok(Value::Error(e)),
        };
        let b = match e1.resolve(arg1, i, j) {
            Ok(v) => v,
            Err(e) => return Ok(Value::Error(e)),
        };
        f(&a, &b)
    })
}

/// Lift a one-operand scalar operation over its argument
///
/// Unlike the two-operand form, errors are handed to `f` so that error-testing
/// functions can be lifted too.
pub fn evaluate_one_array_arg<F>(arg0: &Value, row: u32, col: u16, mut f: F) -> FormulaResult<Value>
where
    F: FnMut(&Value) -> FormulaResult<Value>,
{
    let e0 = Extent::of(arg0, row, col);
    trace!("broadcasting one argument over {}x{}", e0.height, e0.width);

    collect(row, col, e0.height, e0.width, |i, j| {
        let value = e0.resolve(arg0, i, j).unwrap_or_else(Value::Error);
        f(&value)
    })
}

fn collect<F>(row: u32, col: u16, height: u32, width: u16, mut cell: F) -> FormulaResult<Value>
where
    F: FnMut(u32, u16) -> FormulaResult<Value>,
{
    if height == 1 && width == 1 {
        return cell(0, 0);
    }
    if height as u64 * width as u64 > MAX_ARRAY_CELLS {
        warn!("refusing to build a {}x{} array", height, width);
        return Ok(Value::Error(CellError::Num));
    }

    let mut rows = Vec::with_capacity(height as usize);
    for i in 0..height {
        let mut values = Vec::with_capacity(width as usize);
        for j in 0..width {
            values.push(cell(i, j)?);
        }
        rows.push(values);
    }
    Ok(Value::Area(Area::new(row, col, rows)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaError;
    use crate::operators::NumericOperator;
    use pretty_assertions::assert_eq;

    fn numbers(first_row: u32, first_col: u16, rows: &[&[f64]]) -> Value {
        Value::Area(
            Area::new(
                first_row,
                first_col,
                rows.iter()
                    .map(|r| r.iter().map(|n| Value::Number(*n)).collect::<Vec<_>>())
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn add(a: &Value, b: &Value) -> FormulaResult<Value> {
        Ok(NumericOperator::Add.evaluate(a, b, 0, 0))
    }

    fn grid(value: &Value) -> Vec<Vec<Value>> {
        let Value::Area(area) = value else {
            panic!("expected an area, got {:?}", value);
        };
        area.values()
            .chunks(area.width() as usize)
            .map(<[Value]>::to_vec)
            .collect()
    }

    #[test]
    fn test_scalars_give_a_scalar() {
        let result =
            evaluate_two_array_args(&Value::Number(1.0), &Value::Number(2.0), 4, 4, add).unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_scalar_is_repeated_over_area() {
        let area = numbers(10, 3, &[&[1.0, 2.0], &[3.0, 4.0]]);
        let result = evaluate_two_array_args(&area, &Value::Number(10.0), 0, 0, add).unwrap();
        assert_eq!(
            grid(&result),
            vec![
                vec![Value::Number(11.0), Value::Number(12.0)],
                vec![Value::Number(13.0), Value::Number(14.0)],
            ]
        );
        let Value::Area(area) = result else { unreachable!() };
        assert_eq!((area.first_row(), area.first_column()), (0, 0));
    }

    #[test]
    fn test_row_and_column_vectors_expand() {
        let column = numbers(0, 0, &[&[1.0], &[2.0]]);
        let row = numbers(5, 5, &[&[10.0, 20.0, 30.0]]);
        let result = evaluate_two_array_args(&column, &row, 0, 0, add).unwrap();
        assert_eq!(
            grid(&result),
            vec![
                vec![Value::Number(11.0), Value::Number(21.0), Value::Number(31.0)],
                vec![Value::Number(12.0), Value::Number(22.0), Value::Number(32.0)],
            ]
        );
    }

    #[test]
    fn test_mismatched_areas_fill_with_value_errors() {
        let small = numbers(0, 0, &[&[1.0, 2.0], &[3.0, 4.0]]);
        let large = numbers(0, 0, &[&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]]);
        let result = evaluate_two_array_args(&small, &large, 0, 0, add).unwrap();
        let v = Value::Error(CellError::Value);
        assert_eq!(
            grid(&result),
            vec![
                vec![Value::Number(2.0), Value::Number(3.0), v.clone()],
                vec![Value::Number(4.0), Value::Number(5.0), v.clone()],
                vec![v.clone(), v.clone(), v],
            ]
        );
    }

    #[test]
    fn test_errors_stay_in_their_cell() {
        let area = Value::Area(
            Area::new(
                0,
                0,
                vec![vec![Value::Number(1.0), Value::Error(CellError::Na)]],
            )
            .unwrap(),
        );
        let mut calls = 0;
        let result = evaluate_two_array_args(&area, &Value::Number(1.0), 0, 0, |a, b| {
            calls += 1;
            add(a, b)
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(
            grid(&result),
            vec![vec![Value::Number(2.0), Value::Error(CellError::Na)]]
        );
    }

    #[test]
    fn test_left_error_checked_first() {
        let result = evaluate_two_array_args(
            &Value::Error(CellError::Ref),
            &Value::Error(CellError::Div0),
            0,
            0,
            add,
        )
        .unwrap();
        assert_eq!(result, Value::Error(CellError::Ref));
    }

    #[test]
    fn test_union_argument_is_value_error() {
        let union = Value::Union(vec![Area::single(0, 0, Value::Number(1.0))]);
        let result = evaluate_two_array_args(&union, &Value::Number(1.0), 0, 0, add).unwrap();
        assert_eq!(result, Value::Error(CellError::Value));
    }

    #[test]
    fn test_contract_errors_abort() {
        let area = numbers(0, 0, &[&[1.0, 2.0]]);
        let result = evaluate_two_array_args(&area, &Value::Blank, 0, 0, |_, _| {
            Err(FormulaError::Evaluation("boom".into()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_one_arg_passes_errors_through() {
        let area = Value::Area(
            Area::new(
                0,
                0,
                vec![vec![Value::Error(CellError::Na)], vec![Value::Number(1.0)]],
            )
            .unwrap(),
        );
        let result =
            evaluate_one_array_arg(&area, 0, 0, |v| Ok(Value::Boolean(v.is_error()))).unwrap();
        assert_eq!(
            grid(&result),
            vec![vec![Value::Boolean(true)], vec![Value::Boolean(false)]]
        );
    }
}
