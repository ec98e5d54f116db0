//! Built-in Excel functions
//!
//! Functions receive their arguments fully evaluated. References arrive as areas
//! (or unions), so each function decides whether it reads a whole range or reduces
//! an argument to the value at the current cell.

pub mod date;
pub mod info;
pub mod logical;
pub mod math;
pub mod text;

use crate::broadcast::evaluate_one_array_arg;
use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::resolver::{resolve_double, resolve_single_value};
use crate::value::Value;
use ahash::AHashMap;
use sheetcalc_core::CellError;

/// Function implementation signature
///
/// Functions can consult the evaluation context (e.g. workbook settings, date system,
/// current sheet/cell, array mode) to match Excel semantics.
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> FormulaResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_info_functions();
        registry.register_text_functions();
        registry.register_date_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no functions are registered
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn add(&mut self, name: &'static str, min_args: usize, max_args: Option<usize>, f: FunctionImpl) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation: f,
        });
    }

    fn register_math_functions(&mut self) {
        self.add("SUM", 1, None, math::fn_sum);
        self.add("PRODUCT", 1, None, math::fn_product);
        self.add("ABS", 1, Some(1), math::fn_abs);
        self.add("POWER", 2, Some(2), math::fn_power);
        self.add("MOD", 2, Some(2), math::fn_mod);
    }

    fn register_logical_functions(&mut self) {
        self.add("IF", 2, Some(3), logical::fn_if);
        self.add("AND", 1, None, logical::fn_and);
        self.add("OR", 1, None, logical::fn_or);
        self.add("NOT", 1, Some(1), logical::fn_not);
        self.add("IFERROR", 2, Some(2), logical::fn_iferror);
        self.add("TRUE", 0, Some(0), logical::fn_true);
        self.add("FALSE", 0, Some(0), logical::fn_false);
    }

    fn register_info_functions(&mut self) {
        self.add("ISBLANK", 1, Some(1), info::fn_isblank);
        self.add("ISERROR", 1, Some(1), info::fn_iserror);
        self.add("ISERR", 1, Some(1), info::fn_iserr);
        self.add("ISNA", 1, Some(1), info::fn_isna);
        self.add("ISNUMBER", 1, Some(1), info::fn_isnumber);
        self.add("ISTEXT", 1, Some(1), info::fn_istext);
        self.add("ISLOGICAL", 1, Some(1), info::fn_islogical);
        self.add("NA", 0, Some(0), info::fn_na);
    }

    fn register_text_functions(&mut self) {
        self.add("LEN", 1, Some(1), text::fn_len);
        self.add("UPPER", 1, Some(1), text::fn_upper);
        self.add("LOWER", 1, Some(1), text::fn_lower);
        self.add("CONCATENATE", 1, None, text::fn_concatenate);
    }

    fn register_date_functions(&mut self) {
        self.add("DATE", 3, Some(3), date::fn_date);
        self.add("YEAR", 1, Some(1), date::fn_year);
        self.add("MONTH", 1, Some(1), date::fn_month);
        self.add("DAY", 1, Some(1), date::fn_day);
        self.add("DAYS", 2, Some(2), date::fn_days);
        self.add("NETWORKDAYS", 2, Some(3), date::fn_networkdays);
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static MISSING_ARG: Value = Value::MissingArgument;

/// The argument at `index`, or a missing argument past the end
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&MISSING_ARG)
}

/// Reduce an argument to the scalar at the current cell
pub(crate) fn scalar_arg(arg: &Value, ctx: &EvaluationContext) -> Result<Value, CellError> {
    resolve_single_value(arg, ctx.current_row, ctx.current_col)
}

/// Reduce an argument to a number at the current cell
pub(crate) fn number_arg(arg: &Value, ctx: &EvaluationContext) -> Result<f64, CellError> {
    resolve_double(arg, ctx.current_row, ctx.current_col)
}

/// The stored cells of an area or union argument in row-major order, area by area
///
/// Blank padding around a clipped range is not visited.
pub(crate) fn reference_cells(arg: &Value) -> Option<Box<dyn Iterator<Item = &Value> + '_>> {
    match arg {
        Value::Area(area) => Some(Box::new(area.values().iter())),
        Value::Union(areas) => Some(Box::new(areas.iter().flat_map(|a| a.values().iter()))),
        _ => None,
    }
}

/// A finite number, or `#NUM!`
pub(crate) fn number_result(result: Result<f64, CellError>) -> Value {
    match result {
        Ok(n) if n.is_finite() => Value::Number(n),
        Ok(_) => Value::Error(CellError::Num),
        Err(e) => Value::Error(e),
    }
}

/// Apply a one-argument scalar function
///
/// In array mode the function runs once per cell of an area argument; otherwise
/// the argument is reduced to the current cell first. `f` also sees errors.
pub(crate) fn lift_one<F>(arg: &Value, ctx: &EvaluationContext, f: F) -> FormulaResult<Value>
where
    F: Fn(&Value) -> Value,
{
    if ctx.array_mode {
        return evaluate_one_array_arg(arg, ctx.current_row, ctx.current_col, |v| Ok(f(v)));
    }
    let value = scalar_arg(arg, ctx).unwrap_or_else(Value::Error);
    Ok(f(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("sum").is_some());
        assert!(registry.get("NetworkDays").is_some());
        assert!(registry.get("VLOOKUP").is_none());
        assert_eq!(registry.get("if").map(|f| f.max_args), Some(Some(3)));
    }

    #[test]
    fn test_missing_trailing_arguments() {
        let args = [Value::Number(1.0)];
        assert_eq!(arg(&args, 0), &Value::Number(1.0));
        assert_eq!(arg(&args, 3), &Value::MissingArgument);
    }
}
