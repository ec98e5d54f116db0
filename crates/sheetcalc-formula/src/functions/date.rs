//! Date functions and date-valued arguments
//!
//! Excel stores dates as serial numbers (days since a base date).
//!
//! Notes:
//! - In the 1900 date system 1900-01-01 is serial 1, and Excel includes the
//!   historical "1900 leap year" bug, inserting a non-existent day 1900-02-29 as serial 60.
//! - In the 1904 date system 1904-01-01 is serial 0.
//! - A date argument may be given as text. Text that reads as a number is taken as a
//!   serial number; otherwise it is parsed as a calendar date.

use super::{arg, number_arg, number_result};
use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::resolver::{coerce_to_double, parse_double, resolve_single_value};
use crate::value::{Area, Value, MAX_ARRAY_CELLS};
use ahash::AHashSet;
use chrono::{Datelike, Duration, Local, NaiveDate};
use lazy_regex::regex_captures;
use sheetcalc_core::CellError;

/// Serial number of 9999-12-31 in the 1900 system
const MAX_DATE_SERIAL: i64 = 2_958_465;

/// Serial number of 9999-12-31 in the 1904 system
const MAX_DATE_SERIAL_1904: i64 = 2_957_003;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn is_leap_gregorian(year: i32) -> bool {
    (year % 4 == 0) && ((year % 100 != 0) || (year % 400 == 0))
}

fn days_in_year_excel1900(year: i32) -> i64 {
    if year == 1900 || is_leap_gregorian(year) {
        366
    } else {
        365
    }
}

fn days_in_month_excel1900(year: i32, month: u32) -> i64 {
    match month {
        2 if year == 1900 || is_leap_gregorian(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Serial (1900 system) of the first day of the given month
///
/// `None` for years outside 0..=10000; the year after 9999 is kept so that a
/// day offset can still land on 9999-12-31.
fn excel1900_serial_month_start(year: i32, month: u32) -> Option<i64> {
    if !(0..=10_000).contains(&year) {
        return None;
    }
    if year >= 1900 {
        let days: i64 = (1900..year).map(days_in_year_excel1900).sum::<i64>()
            + (1..month)
                .map(|m| days_in_month_excel1900(year, m))
                .sum::<i64>();
        return Some(1 + days);
    }

    // The leap-year bug does not apply before 1900
    let base = NaiveDate::from_ymd_opt(1899, 12, 31)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some((first - base).num_days())
}

fn excel1900_serial_from_ymd(year: i32, month: u32, day: i32) -> Option<i64> {
    Some(excel1900_serial_month_start(year, month)? + (day as i64) - 1)
}

fn max_serial(date_1904: bool) -> i64 {
    if date_1904 {
        MAX_DATE_SERIAL_1904
    } else {
        MAX_DATE_SERIAL
    }
}

fn excel1904_serial_from_date(date: NaiveDate) -> Option<i64> {
    let base = NaiveDate::from_ymd_opt(1904, 1, 1)?;
    Some((date - base).num_days())
}

fn excel1904_date_from_serial(serial: i64) -> Option<(i32, u32, u32)> {
    let base = NaiveDate::from_ymd_opt(1904, 1, 1)?;
    let date = base.checked_add_signed(Duration::try_days(serial)?)?;
    Some((date.year(), date.month(), date.day()))
}

fn excel1900_date_from_serial(serial: i64) -> Option<(i32, u32, u32)> {
    // Serial 0 is the pseudo-date 1900-01-00 and serial 60 the fictional 1900-02-29.
    match serial {
        0 => return Some((1900, 1, 0)),
        60 => return Some((1900, 2, 29)),
        _ => {}
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 31)?;
    let adjusted = if serial > 60 { serial - 1 } else { serial };
    let date = base.checked_add_signed(Duration::try_days(adjusted)?)?;
    Some((date.year(), date.month(), date.day()))
}

/// Serial number of a calendar date, or `None` before the epoch
pub fn serial_from_date(date: NaiveDate, date_1904: bool) -> Option<f64> {
    let serial = if date_1904 {
        excel1904_serial_from_date(date)?
    } else if date.year() < 1900 {
        return None;
    } else {
        excel1900_serial_from_ymd(date.year(), date.month(), date.day() as i32)?
    };
    (serial >= 0).then_some(serial as f64)
}

/// Day of the week of a serial number, 0 for Sunday
fn weekday(serial: i64, date_1904: bool) -> i64 {
    if date_1904 {
        // 1904-01-01 was a Friday
        (serial + 5).rem_euclid(7)
    } else {
        (serial - 1).rem_euclid(7)
    }
}

fn parse_month(text: &str) -> Option<u32> {
    if let Ok(n) = text.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = text.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| *name == lower || (lower.len() == 3 && name.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

/// Split date text into (year, month, day); the year is absent for `mm-dd` and `mm/dd`
fn split_date_text(s: &str) -> Option<(Option<i32>, u32, u32)> {
    let (year, month, day) = if let Some((_, y, m, d)) =
        regex_captures!(r"^(\d{4})-([A-Za-z]+|\d{1,2})-(\d{1,2})$", s)
    {
        (Some(y), m, d)
    } else if let Some((_, d, m, y)) =
        regex_captures!(r"^(\d{1,2})-([A-Za-z]+|\d{1,2})-(\d{4})$", s)
    {
        (Some(y), m, d)
    } else if let Some((_, m, d)) = regex_captures!(r"^([A-Za-z]+|\d{1,2})-(\d{1,2})$", s) {
        (None, m, d)
    } else if let Some((_, m, d, y)) =
        regex_captures!(r"^([A-Za-z]+|\d{1,2})/(\d{1,2})/(\d{4})$", s)
    {
        (Some(y), m, d)
    } else if let Some((_, y, m, d)) =
        regex_captures!(r"^(\d{4})/([A-Za-z]+|\d{1,2})/(\d{1,2})$", s)
    {
        (Some(y), m, d)
    } else if let Some((_, m, d)) = regex_captures!(r"^([A-Za-z]+|\d{1,2})/(\d{1,2})$", s) {
        (None, m, d)
    } else {
        return None;
    };

    let year = match year {
        Some(y) => Some(y.parse().ok()?),
        None => None,
    };
    Some((year, parse_month(month)?, day.parse().ok()?))
}

/// Parse calendar-date text to a serial number
///
/// Accepted: `yyyy-mm-dd`, `dd-mm-yyyy`, `mm-dd`, `mm/dd/yyyy`, `yyyy/mm/dd` and
/// `mm/dd`, where the month may also be an English name or abbreviation. A time of
/// day after the date is ignored, and forms without a year use the current one.
pub fn parse_date_text(text: &str, date_1904: bool) -> Option<f64> {
    let date_part = text.split_whitespace().next()?;
    let (year, month, day) = split_date_text(date_part)?;
    let year = year.unwrap_or_else(|| Local::now().year());
    serial_from_date(NaiveDate::from_ymd_opt(year, month, day)?, date_1904)
}

/// Evaluate an argument that holds one date, as seen from (`row`, `col`)
///
/// Numeric text is a serial number before it is ever read as a date, so `"45000"`
/// is serial 45000 and `"2024-01-15"` is the serial of that day.
pub fn evaluate_date_arg(
    arg: &Value,
    row: u32,
    col: u16,
    date_1904: bool,
) -> Result<f64, CellError> {
    let value = resolve_single_value(arg, row, col)?;
    if let Value::Text(text) = &value {
        if let Some(n) = parse_double(text) {
            return Ok(n);
        }
        return parse_date_text(text, date_1904).ok_or(CellError::Value);
    }
    coerce_to_double(&value)
}

/// Evaluate an argument that holds a list of dates
///
/// An absent or omitted argument is an empty list. An area gives one date per cell
/// in row-major order, a union each of its areas in turn, and a scalar one date.
pub fn evaluate_dates_arg(
    arg: Option<&Value>,
    row: u32,
    col: u16,
    date_1904: bool,
) -> Result<Vec<f64>, CellError> {
    match arg {
        None | Some(Value::MissingArgument) => Ok(Vec::new()),
        Some(Value::Area(area)) => area_dates(area, date_1904),
        Some(Value::Union(areas)) => {
            let mut dates = Vec::new();
            for area in areas {
                dates.extend(area_dates(area, date_1904)?);
            }
            Ok(dates)
        }
        Some(other) => Ok(vec![evaluate_date_arg(other, row, col, date_1904)?]),
    }
}

fn area_dates(area: &Area, date_1904: bool) -> Result<Vec<f64>, CellError> {
    if area.cell_count() > MAX_ARRAY_CELLS {
        return Err(CellError::Num);
    }
    area.iter()
        .map(|(row, col, cell)| evaluate_date_arg(cell, row, col, date_1904))
        .collect()
}

fn date_arg(args: &[Value], index: usize, ctx: &EvaluationContext) -> Result<f64, CellError> {
    evaluate_date_arg(
        arg(args, index),
        ctx.current_row,
        ctx.current_col,
        ctx.date_1904(),
    )
}

/// DATE(year, month, day)
pub fn fn_date(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let mut parts = [0i32; 3];
    for (i, part) in parts.iter_mut().enumerate() {
        match number_arg(arg(args, i), ctx) {
            Ok(n) => *part = n.trunc() as i32,
            Err(e) => return Ok(Value::Error(e)),
        }
    }
    let [mut year, month, day] = parts;

    // Excel: years 0..1899 are treated as 1900..3799
    if (0..1900).contains(&year) {
        year += 1900;
    }

    // Basic bounds (Excel supports 0..9999 in DATE)
    if !(0..=9999).contains(&year) {
        return Ok(Value::Error(CellError::Num));
    }

    // Normalize month overflow/underflow.
    // Use 0-based month index to handle negatives correctly.
    let total_months = (year as i64) * 12 + (month as i64 - 1);
    let norm_year = total_months.div_euclid(12) as i32;
    let norm_month = total_months.rem_euclid(12) as u32 + 1;

    let serial = if ctx.date_1904() {
        // 1904 system: use chrono (no leap-year bug)
        NaiveDate::from_ymd_opt(norm_year, norm_month, 1)
            .and_then(|first| first.checked_add_signed(Duration::try_days(day as i64 - 1)?))
            .and_then(excel1904_serial_from_date)
    } else {
        excel1900_serial_from_ymd(norm_year, norm_month, day)
    };

    let max = max_serial(ctx.date_1904());
    Ok(match serial {
        Some(serial) if (0..=max).contains(&serial) => Value::Number(serial as f64),
        _ => Value::Error(CellError::Num),
    })
}

fn date_parts(args: &[Value], ctx: &EvaluationContext) -> Result<(i32, u32, u32), CellError> {
    let serial = date_arg(args, 0, ctx)?.floor();
    if !(0.0..=max_serial(ctx.date_1904()) as f64).contains(&serial) {
        return Err(CellError::Num);
    }
    let serial = serial as i64;

    let parts = if ctx.date_1904() {
        excel1904_date_from_serial(serial)
    } else {
        excel1900_date_from_serial(serial)
    };
    parts.ok_or(CellError::Num)
}

/// YEAR(serial)
pub fn fn_year(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(number_result(date_parts(args, ctx).map(|(y, _, _)| y as f64)))
}

/// MONTH(serial)
pub fn fn_month(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(number_result(date_parts(args, ctx).map(|(_, m, _)| m as f64)))
}

/// DAY(serial)
pub fn fn_day(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(number_result(date_parts(args, ctx).map(|(_, _, d)| d as f64)))
}

/// DAYS(end_date, start_date)
pub fn fn_days(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    let days = date_arg(args, 0, ctx)
        .and_then(|end| Ok(end.floor() - date_arg(args, 1, ctx)?.floor()));
    Ok(number_result(days))
}

/// NETWORKDAYS(start_date, end_date, [holidays])
///
/// Counts Monday to Friday between the two dates inclusive, skipping holidays.
/// The count is negative when the start date is after the end date.
pub fn fn_networkdays(args: &[Value], ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(number_result(networkdays(args, ctx)))
}

fn networkdays(args: &[Value], ctx: &EvaluationContext) -> Result<f64, CellError> {
    let date_1904 = ctx.date_1904();
    let start = date_arg(args, 0, ctx)?.floor();
    let end = date_arg(args, 1, ctx)?.floor();
    let valid = 0.0..=max_serial(date_1904) as f64;
    if !valid.contains(&start) || !valid.contains(&end) {
        return Err(CellError::Num);
    }

    let holidays: AHashSet<i64> = evaluate_dates_arg(
        args.get(2),
        ctx.current_row,
        ctx.current_col,
        date_1904,
    )?
    .into_iter()
    .map(|d| d.floor() as i64)
    .collect();

    let (first, last, sign) = if start <= end {
        (start as i64, end as i64, 1.0)
    } else {
        (end as i64, start as i64, -1.0)
    };

    let count = (first..=last)
        .filter(|&serial| !matches!(weekday(serial, date_1904), 0 | 6))
        .filter(|serial| !holidays.contains(serial))
        .count();
    Ok(sign * count as f64)
}
