//! Operand resolution and scalar coercion
//!
//! Operators and functions reduce their arguments to single scalars here. The
//! `Err` side of every function is a spreadsheet error, never a [`FormulaError`].
//!
//! [`FormulaError`]: crate::FormulaError

use crate::value::{Area, Value};
use lazy_regex::regex_is_match;
use sheetcalc_core::CellError;

/// Reduce an argument to one scalar as seen from the cell at (`row`, `col`)
///
/// Scalars pass through, an error value comes back as `Err`, and an area is
/// reduced by implicit intersection. The `Ok` value is never an error, area or union.
pub fn resolve_single_value(arg: &Value, row: u32, col: u16) -> Result<Value, CellError> {
    match arg {
        Value::Error(e) => Err(*e),
        Value::Area(area) => resolve_single_value(choose_single_element(area, row, col)?, row, col),
        Value::Union(_) => Err(CellError::Value),
        Value::Number(_) | Value::Text(_) | Value::Boolean(_) | Value::Blank | Value::MissingArgument => {
            Ok(arg.clone())
        }
    }
}

/// Implicit intersection of an area with the current cell
///
/// A single cell is always chosen. A single column picks the current row, a single
/// row picks the current column, and a 2-D area must contain the current cell
/// itself. Anything else is `#VALUE!`.
pub fn choose_single_element(area: &Area, row: u32, col: u16) -> Result<&Value, CellError> {
    let (row, col) = match (area.is_row(), area.is_column()) {
        (true, true) => (area.first_row(), area.first_column()),
        (false, true) => (row, area.first_column()),
        (true, false) => (area.first_row(), col),
        (false, false) => (row, col),
    };
    area.absolute_value(row, col).ok_or(CellError::Value)
}

/// Resolve then coerce to a number
pub fn resolve_double(arg: &Value, row: u32, col: u16) -> Result<f64, CellError> {
    coerce_to_double(&resolve_single_value(arg, row, col)?)
}

/// Coerce a resolved value to a number
///
/// Text converts only when it is a plain decimal literal.
pub fn coerce_to_double(value: &Value) -> Result<f64, CellError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Blank | Value::MissingArgument => Ok(0.0),
        Value::Text(s) => parse_double(s).ok_or(CellError::Value),
        Value::Error(e) => Err(*e),
        Value::Area(_) | Value::Union(_) => Err(CellError::Value),
    }
}

/// Coerce a resolved value to a boolean, using `default_if_blank` for blanks
pub fn coerce_to_boolean(value: &Value, default_if_blank: bool) -> Result<bool, CellError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Number(n) if n.is_nan() => Err(CellError::Value),
        Value::Number(n) => Ok(*n != 0.0),
        Value::Blank | Value::MissingArgument => Ok(default_if_blank),
        Value::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
        Value::Text(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
        Value::Text(_) => Err(CellError::Value),
        Value::Error(e) => Err(*e),
        Value::Area(_) | Value::Union(_) => Err(CellError::Value),
    }
}

/// Coerce a resolved value to text
pub fn coerce_to_text(value: &Value) -> Result<String, CellError> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        Value::Number(n) => Ok(format_number(*n)),
        Value::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Blank | Value::MissingArgument => Ok(String::new()),
        Value::Error(e) => Err(*e),
        Value::Area(_) | Value::Union(_) => Err(CellError::Value),
    }
}

/// Parse a locale-independent decimal literal
///
/// Surrounding whitespace, a sign, a fraction and an exponent are accepted.
/// Hex, `inf`, `nan` and out-of-range magnitudes are not.
pub fn parse_double(s: &str) -> Option<f64> {
    let s = s.trim();
    if !regex_is_match!(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$", s) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number the way a General-formatted cell shows it
///
/// Up to 15 significant digits, no trailing zeros, and scientific notation for
/// magnitudes of 1E+15 and above or below 1E-9.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if !n.is_finite() {
        return CellError::Num.to_string();
    }

    let sci = format!("{:.14e}", n);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return n.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return n.to_string();
    };

    if (-9..15).contains(&exponent) {
        let decimals = (14 - exponent).max(0) as usize;
        trim_fraction(format!("{:.*}", decimals, n))
    } else {
        format!(
            "{}E{}{:02}",
            trim_fraction(mantissa.to_string()),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    }
}

fn trim_fraction(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
