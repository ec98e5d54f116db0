//! Sheet names as written in formula text, standalone and inside references.

use pretty_assertions::assert_eq;
use sheetcalc_formula::{format_sheet_name, format_sheet_range, parse_formula, SheetReference};

#[test]
fn test_sheet_name_table() {
    let cases: &[(Option<&str>, &str)] = &[
        (Some("abc"), "abc"),
        (Some("123"), "'123'"),
        (Some("my sheet"), "'my sheet'"),
        (Some("O'Brian"), "'O''Brian'"),
        (Some("_"), "_"),
        (Some("TRUE"), "'TRUE'"),
        (Some("false"), "'false'"),
        (Some("A1"), "'A1'"),
        (Some("IV65536"), "'IV65536'"),
        (Some("IW1"), "IW1"),
        (Some("Sales2024"), "Sales2024"),
        (Some(""), "''"),
        (None, "#REF"),
    ];
    for (name, expected) in cases {
        assert_eq!(&format_sheet_name(*name), expected, "{:?}", name);
    }
}

#[test]
fn test_workbook_qualified_names() {
    assert_eq!(format_sheet_range(0, Some("abc"), None), "[0]abc");
    assert_eq!(format_sheet_range(2, Some("my sheet"), None), "'[2]my sheet'");
    assert_eq!(format_sheet_range(-1, Some("Jan"), Some("Mar")), "Jan:Mar");
    assert_eq!(
        format_sheet_range(1, Some("Jan"), Some("Q 4")),
        "'[1]Jan:Q 4'"
    );
}

#[test]
fn test_sheet_reference_display() {
    let mut sheet = SheetReference::local("Budget");
    assert_eq!(sheet.to_string(), "Budget");

    sheet.first_sheet = "Budget 2024".into();
    assert_eq!(sheet.to_string(), "'Budget 2024'");

    sheet.workbook_index = Some(3);
    sheet.last_sheet = Some("Budget 2025".into());
    assert_eq!(sheet.to_string(), "'[3]Budget 2024:Budget 2025'");
}

#[test]
fn test_references_render_back_to_formula_text() {
    for text in [
        "='my sheet'!A1",
        "='123'!A1",
        "='TRUE'!B2",
        "='A1'!C3",
        "='O''Brian'!$D$4",
        "=Sales2024!A1:B10",
        "=[1]Sales!A1",
        "='[1]my sheet'!A1",
        "=Jan:Mar!A1",
        "='Q 1:Q 4'!A1:B2",
    ] {
        let ast = parse_formula(text).unwrap();
        assert_eq!(format!("={}", ast), text);
    }
}

#[test]
fn test_unneeded_quotes_are_dropped() {
    let ast = parse_formula("='Sales'!A1").unwrap();
    assert_eq!(format!("={}", ast), "=Sales!A1");
}
