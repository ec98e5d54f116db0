//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values.

use crate::ast::{BinaryOperator, FormulaExpr, RangeReference, SheetReference, UnaryOperator};
use crate::broadcast::{evaluate_one_array_arg, evaluate_two_array_args};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::operators::concat;
use crate::parser::parse_formula;
use crate::resolver::resolve_single_value;
use crate::value::{Area, Value, MAX_ARRAY_CELLS};
use log::{debug, trace, warn};
use sheetcalc_core::{CellError, CellRange, Workbook, Worksheet};
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// How deeply defined names may refer to other defined names
const MAX_NAME_DEPTH: usize = 32;

/// Ranges up to this many cells are read cell by cell
const DENSE_READ_LIMIT: u64 = 1 << 16;

/// Context for formula evaluation
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Reference to the workbook for cell lookups
    pub workbook: Option<&'a Workbook>,
    /// Current worksheet index
    pub current_sheet: usize,
    /// Current cell row (for implicit intersection and array anchoring)
    pub current_row: u32,
    /// Current cell column
    pub current_col: u16,
    /// Evaluate as an array formula: operators work element-wise over areas
    /// instead of intersecting them with the current cell
    pub array_mode: bool,
    name_depth: usize,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(workbook: Option<&'a Workbook>, sheet: usize, row: u32, col: u16) -> Self {
        Self {
            workbook,
            current_sheet: sheet,
            current_row: row,
            current_col: col,
            array_mode: false,
            name_depth: 0,
        }
    }

    /// Create a simple context without workbook (for testing)
    pub fn simple() -> Self {
        Self::new(None, 0, 0, 0)
    }

    /// Switch array-formula evaluation on or off
    pub fn with_array_mode(mut self, array_mode: bool) -> Self {
        self.array_mode = array_mode;
        self
    }

    /// Whether the workbook uses the 1904 date system
    pub fn date_1904(&self) -> bool {
        self.workbook
            .map(|wb| wb.settings().date_1904)
            .unwrap_or(false)
    }

    /// Indexes of the sheets a reference points at, in workbook order
    fn resolve_sheets(
        &self,
        workbook: &Workbook,
        sheet: Option<&SheetReference>,
    ) -> Result<Vec<usize>, CellError> {
        let Some(sheet) = sheet else {
            return Ok(vec![self.current_sheet]);
        };

        if let Some(index) = sheet.workbook_index {
            warn!("reference into external workbook [{}] evaluates to #REF!", index);
            return Err(CellError::Ref);
        }

        let lookup = |name: &str| {
            workbook.sheet_index(name).ok_or_else(|| {
                warn!("reference to unknown sheet '{}'", name);
                CellError::Ref
            })
        };

        let first = lookup(&sheet.first_sheet)?;
        let last = match &sheet.last_sheet {
            Some(name) => lookup(name)?,
            None => first,
        };
        Ok((first.min(last)..=first.max(last)).collect())
    }

    /// Read a rectangular block from each referenced sheet
    fn get_areas(
        &self,
        sheet: Option<&SheetReference>,
        range: &CellRange,
    ) -> FormulaResult<Result<Vec<Area>, CellError>> {
        let Some(workbook) = self.workbook else {
            return blank_area(range).map(|area| Ok(vec![area]));
        };

        let sheets = match self.resolve_sheets(workbook, sheet) {
            Ok(sheets) => sheets,
            Err(e) => return Ok(Err(e)),
        };

        let mut areas = Vec::with_capacity(sheets.len());
        for index in sheets {
            let Some(worksheet) = workbook.worksheet(index) else {
                return Ok(Err(CellError::Ref));
            };
            if range.cell_count() <= DENSE_READ_LIMIT {
                areas.push(Area::new(
                    range.start.row,
                    range.start.col,
                    read_cells(worksheet, range),
                )?);
                continue;
            }

            // Only the part of a large range that holds data is read
            let area = blank_area(range)?;
            let Some(used) = worksheet.used_range().and_then(|u| u.intersection(range)) else {
                areas.push(area);
                continue;
            };
            if used.cell_count() > MAX_ARRAY_CELLS {
                warn!(
                    "range {} holds {} cells of data, more than {}",
                    range,
                    used.cell_count(),
                    MAX_ARRAY_CELLS
                );
                return Ok(Err(CellError::Num));
            }
            trace!("reading {} of {} from sheet {}", used, range, index);
            areas.push(area.with_cells(
                used.start.row,
                used.start.col,
                read_cells(worksheet, &used),
            )?);
        }
        Ok(Ok(areas))
    }

    /// Evaluate a reference the way operators and functions see it
    ///
    /// One sheet gives a scalar for a single cell and an area otherwise; a 3-D
    /// reference gives a union with one area per sheet.
    fn get_reference_value(
        &self,
        sheet: Option<&SheetReference>,
        range: &CellRange,
        single_cell: bool,
    ) -> FormulaResult<Value> {
        let mut areas = match self.get_areas(sheet, range)? {
            Ok(areas) => areas,
            Err(e) => return Ok(Value::Error(e)),
        };

        if areas.len() > 1 {
            return Ok(Value::Union(areas));
        }
        let Some(area) = areas.pop() else {
            return Ok(Value::Error(CellError::Ref));
        };
        if single_cell {
            return Ok(area.relative_value(0, 0).cloned().unwrap_or(Value::Blank));
        }
        Ok(Value::Area(area))
    }

    /// Resolve a defined name to its value
    ///
    /// The name's formula text is parsed and evaluated like any other formula, so
    /// it may be a constant, a reference or an expression. Unknown names are `#NAME?`.
    pub fn resolve_named_range(&self, name: &str) -> FormulaResult<Value> {
        let Some(workbook) = self.workbook else {
            return Ok(Value::Error(CellError::Name));
        };
        let Some(named_range) = workbook.get_named_range(name, self.current_sheet) else {
            return Ok(Value::Error(CellError::Name));
        };

        if self.name_depth >= MAX_NAME_DEPTH {
            return Err(FormulaError::CircularReference);
        }
        debug!("resolving name {} as {}", name, named_range.refers_to);

        let ast = parse_formula(&named_range.formula())?;
        let inner = EvaluationContext {
            name_depth: self.name_depth + 1,
            ..*self
        };
        evaluate(&ast, &inner)
    }
}

fn blank_area(range: &CellRange) -> FormulaResult<Area> {
    Area::blank(
        range.start.row,
        range.start.col,
        range.row_count(),
        range.col_count(),
    )
}

fn read_cells(worksheet: &Worksheet, range: &CellRange) -> Vec<Vec<Value>> {
    (range.start.row..=range.end.row)
        .map(|row| {
            (range.start.col..=range.end.col)
                .map(|col| Value::from(worksheet.get_value_at(row, col)))
                .collect()
        })
        .collect()
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<Value> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(Value::Number(*n)),
        FormulaExpr::String(s) => Ok(Value::Text(s.clone())),
        FormulaExpr::Boolean(b) => Ok(Value::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(Value::Error(*e)),
        FormulaExpr::Missing => Ok(Value::MissingArgument),

        // === References ===
        FormulaExpr::CellRef(cell_ref) => ctx.get_reference_value(
            cell_ref.sheet.as_ref(),
            &CellRange::single(cell_ref.address),
            true,
        ),

        FormulaExpr::RangeRef(range_ref) => {
            ctx.get_reference_value(range_ref.sheet.as_ref(), &range_ref.range, false)
        }

        FormulaExpr::NameRef(name) => ctx.resolve_named_range(name),

        // === Operators ===
        FormulaExpr::BinaryOp {
            op: BinaryOperator::Union,
            left,
            right,
        } => evaluate_union(left, right, ctx),

        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),

        // === Arrays ===
        FormulaExpr::Array(rows) => {
            let mut result_rows = Vec::with_capacity(rows.len());
            for row in rows {
                let mut result_row = Vec::with_capacity(row.len());
                for expr in row {
                    let value = evaluate(expr, ctx)?;
                    result_row.push(if value.is_scalar() {
                        value
                    } else {
                        Value::Error(CellError::Value)
                    });
                }
                result_rows.push(result_row);
            }
            Ok(Value::Area(Area::new(
                ctx.current_row,
                ctx.current_col,
                result_rows,
            )?))
        }
    }
}

/// Parse and evaluate formula text in one step
///
/// Outside array mode a multi-cell result is reduced to the value at the current
/// cell, the way a single-cell formula displays it.
pub fn evaluate_formula(formula: &str, ctx: &EvaluationContext) -> FormulaResult<Value> {
    let ast = parse_formula(formula)?;
    let value = evaluate(&ast, ctx)?;
    if ctx.array_mode {
        return Ok(value);
    }
    Ok(resolve_single_value(&value, ctx.current_row, ctx.current_col).unwrap_or_else(Value::Error))
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    // Evaluate operands first
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;
    let (row, col) = (ctx.current_row, ctx.current_col);

    if ctx.array_mode {
        evaluate_two_array_args(&left_val, &right_val, row, col, |a, b| {
            apply_binary_op(op, a, b, row, col)
        })
    } else {
        apply_binary_op(op, &left_val, &right_val, row, col)
    }
}

fn apply_binary_op(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    row: u32,
    col: u16,
) -> FormulaResult<Value> {
    if let Some(numeric) = op.numeric() {
        return Ok(numeric.evaluate(left, right, row, col));
    }
    if let Some(relational) = op.relational() {
        return relational.evaluate(left, right, row, col);
    }
    match op {
        BinaryOperator::Concat => Ok(concat(left, right, row, col)),
        _ => Err(FormulaError::Evaluation(format!(
            "operator '{}' needs reference operands",
            op.symbol()
        ))),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let val = evaluate(operand, ctx)?;
    let (row, col) = (ctx.current_row, ctx.current_col);

    if ctx.array_mode {
        evaluate_one_array_arg(&val, row, col, |v| Ok(op.evaluate(v, row, col)))
    } else {
        Ok(op.evaluate(&val, row, col))
    }
}

/// Evaluate `(a,b,...)` to a union of the areas each member refers to
fn evaluate_union(
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let mut areas = match reference_areas(left, ctx)? {
        Ok(areas) => areas,
        Err(e) => return Ok(Value::Error(e)),
    };
    match reference_areas(right, ctx)? {
        Ok(more) => areas.extend(more),
        Err(e) => return Ok(Value::Error(e)),
    }
    Ok(Value::Union(areas))
}

fn reference_areas(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Result<Vec<Area>, CellError>> {
    match expr {
        FormulaExpr::CellRef(cell_ref) => {
            ctx.get_areas(cell_ref.sheet.as_ref(), &CellRange::single(cell_ref.address))
        }
        FormulaExpr::RangeRef(RangeReference { sheet, range }) => {
            ctx.get_areas(sheet.as_ref(), range)
        }
        other => Ok(match evaluate(other, ctx)? {
            Value::Area(area) => Ok(vec![area]),
            Value::Union(areas) => Ok(areas),
            Value::Error(e) => Err(e),
            _ => Err(CellError::Value),
        }),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    trace!("calling {} with {} arguments", func.name, evaluated_args.len());
    (func.implementation)(&evaluated_args, ctx)
}
