//! Rendering sheet names as they appear in formula text
//!
//! A name is written bare when it could not be mistaken for anything else, and
//! wrapped in single quotes otherwise: `Sales`, `'my sheet'`, `'O''Brian'`, `'A1'`.
//! An external workbook index goes in brackets in front of the name, inside the
//! quotes when there are any (`[1]Sales`, `'[1]my sheet'`).

use lazy_regex::regex_captures;
use sheetcalc_core::CellAddress;
use std::fmt::Write;

/// Placeholder written when a sheet no longer exists
const DELETED_SHEET: &str = "#REF";

/// Largest column usable by an unquoted name that looks like a cell (`IV`)
const MAX_LEGACY_COLUMN: u16 = 255;

/// Largest row usable by an unquoted name that looks like a cell
const MAX_LEGACY_ROW: u32 = 65_536;

/// Format one sheet name
pub fn format_sheet_name(name: Option<&str>) -> String {
    format_sheet_range(-1, name, None)
}

/// Append one sheet name to `out`
pub fn append_sheet_name(out: &mut String, name: Option<&str>) {
    append_sheet_range(out, -1, name, None)
}

/// Format a sheet or a range of sheets, with an optional workbook index
///
/// A negative `workbook_index` means the sheets are in the current workbook.
pub fn format_sheet_range(workbook_index: i32, first: Option<&str>, last: Option<&str>) -> String {
    let mut out = String::new();
    append_sheet_range(&mut out, workbook_index, first, last);
    out
}

/// Append a sheet or range of sheets to `out`
pub fn append_sheet_range(
    out: &mut String,
    workbook_index: i32,
    first: Option<&str>,
    last: Option<&str>,
) {
    let quoted = first.map_or(false, needs_delimiting) || last.map_or(false, needs_delimiting);

    if quoted {
        out.push('\'');
    }
    if workbook_index >= 0 {
        let _ = write!(out, "[{}]", workbook_index);
    }

    push_name(out, first.unwrap_or(DELETED_SHEET), quoted);
    if let Some(last) = last {
        out.push(':');
        push_name(out, last, quoted);
    }

    if quoted {
        out.push('\'');
    }
}

fn push_name(out: &mut String, name: &str, quoted: bool) {
    if !quoted {
        out.push_str(name);
        return;
    }
    for c in name.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
}

/// Whether a sheet name must be quoted in formula text
pub fn needs_delimiting(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return true;
    };
    if first.is_ascii_digit() {
        return true;
    }
    if name.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return true;
    }
    name_looks_like_boolean_literal(name) || name_looks_like_plain_cell_reference(name)
}

/// `TRUE` or `FALSE` in any letter case
pub fn name_looks_like_boolean_literal(name: &str) -> bool {
    name.eq_ignore_ascii_case("TRUE") || name.eq_ignore_ascii_case("FALSE")
}

/// Letters followed by digits that address a cell in a 256 x 65536 grid
///
/// `A1` and `IV65536` qualify, `IW1`, `A65537` and `A0` do not.
pub fn name_looks_like_plain_cell_reference(name: &str) -> bool {
    let Some((_, letters, digits)) = regex_captures!(r"^([A-Za-z]+)([0-9]+)$", name) else {
        return false;
    };
    if letters.len() > 2 {
        return false;
    }
    let column_ok = CellAddress::letters_to_column(letters)
        .map_or(false, |col| col <= MAX_LEGACY_COLUMN);
    let row_ok = digits
        .parse::<u32>()
        .map_or(false, |row| (1..=MAX_LEGACY_ROW).contains(&row));
    column_ok && row_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names() {
        assert_eq!(format_sheet_name(Some("abc")), "abc");
        assert_eq!(format_sheet_name(Some("_")), "_");
        assert_eq!(format_sheet_name(Some("Sheet_2")), "Sheet_2");
    }

    #[test]
    fn test_quoted_names() {
        assert_eq!(format_sheet_name(Some("123")), "'123'");
        assert_eq!(format_sheet_name(Some("my sheet")), "'my sheet'");
        assert_eq!(format_sheet_name(Some("O'Brian")), "'O''Brian'");
        assert_eq!(format_sheet_name(Some("TRUE")), "'TRUE'");
        assert_eq!(format_sheet_name(Some("false")), "'false'");
        assert_eq!(format_sheet_name(Some("")), "''");
        assert_eq!(format_sheet_name(Some("a.b")), "'a.b'");
        assert_eq!(format_sheet_name(Some("Über")), "'Über'");
    }

    #[test]
    fn test_missing_sheet() {
        assert_eq!(format_sheet_name(None), "#REF");
        assert_eq!(format_sheet_range(-1, None, None), "#REF");
    }

    #[test]
    fn test_cell_like_names() {
        assert_eq!(format_sheet_name(Some("A1")), "'A1'");
        assert_eq!(format_sheet_name(Some("iv65536")), "'iv65536'");
        assert_eq!(format_sheet_name(Some("IW1")), "IW1");
        assert_eq!(format_sheet_name(Some("A65537")), "A65537");
        assert_eq!(format_sheet_name(Some("A0")), "A0");
        assert_eq!(format_sheet_name(Some("ABC1")), "ABC1");
        assert_eq!(format_sheet_name(Some("A1B")), "A1B");
    }

    #[test]
    fn test_workbook_index() {
        assert_eq!(format_sheet_range(0, Some("abc"), None), "[0]abc");
        assert_eq!(format_sheet_range(0, Some("my sheet"), None), "'[0]my sheet'");
        assert_eq!(format_sheet_range(3, Some("abc"), Some("abc")), "[3]abc:abc");
    }

    #[test]
    fn test_sheet_ranges() {
        assert_eq!(
            format_sheet_range(-1, Some("Sheet1"), Some("Sheet3")),
            "Sheet1:Sheet3"
        );
        assert_eq!(
            format_sheet_range(-1, Some("Sheet1"), Some("my sheet")),
            "'Sheet1:my sheet'"
        );
        assert_eq!(
            format_sheet_range(2, Some("O'Brian"), Some("Z")),
            "'[2]O''Brian:Z'"
        );
    }

    #[test]
    fn test_append_keeps_existing_text() {
        let mut out = String::from("=SUM(");
        append_sheet_name(&mut out, Some("my sheet"));
        out.push_str("!A1)");
        assert_eq!(out, "=SUM('my sheet'!A1)");
    }
}
