//! # sheetcalc-formula
//!
//! Formula values and evaluation for sheetcalc.
//!
//! This crate provides:
//! - The formula value model ([`Value`], [`Area`]) and its coercion rules
//! - Comparison, arithmetic and concatenation operators
//! - Element-wise broadcasting of operators over areas
//! - Sheet name rendering for references
//! - Formula parsing (text → AST) and evaluation (AST → value)
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::Workbook;
//! use sheetcalc_formula::{evaluate_formula, EvaluationContext, Value};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("B1", -27.0).unwrap();
//! sheet.set_cell_value("C1", 1.0 / 3.0).unwrap();
//!
//! let ctx = EvaluationContext::new(Some(&workbook), 0, 0, 0);
//! assert_eq!(evaluate_formula("=B1^C1", &ctx).unwrap(), Value::Number(-3.0));
//! ```

pub mod ast;
pub mod broadcast;
pub mod compare;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod operators;
pub mod parser;
pub mod resolver;
pub mod sheet_name;
pub mod value;

pub use ast::{
    BinaryOperator, CellReference, FormulaExpr, RangeReference, SheetReference, UnaryOperator,
};
pub use broadcast::{evaluate_one_array_arg, evaluate_two_array_args};
pub use compare::{compare, RelationalOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_formula, EvaluationContext};
pub use functions::date::{evaluate_date_arg, evaluate_dates_arg};
pub use operators::{concat, power, NumericOperator};
pub use parser::parse_formula;
pub use resolver::{
    choose_single_element, coerce_to_boolean, coerce_to_double, coerce_to_text, format_number,
    parse_double, resolve_double, resolve_single_value,
};
pub use sheet_name::{
    append_sheet_name, append_sheet_range, format_sheet_name, format_sheet_range,
    needs_delimiting,
};
pub use value::{Area, Value, MAX_ARRAY_CELLS};
