//! # sheetcalc-core
//!
//! Cell-level data for the sheetcalc formula engine.
//!
//! This crate provides the types a formula is evaluated against:
//! - [`CellValue`] and [`CellError`] - Stored cell values and spreadsheet error codes
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`Workbook`], [`Worksheet`] - A snapshot of sheets, defined names and settings
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Hello").unwrap();
//! sheet.set_cell_value_at(0, 1, CellValue::Number(42.0)).unwrap();
//! assert_eq!(sheet.get_value("B1").unwrap(), &CellValue::Number(42.0));
//! ```

pub mod cell;
pub mod error;
pub mod named_range;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellError, CellRange, CellValue, SharedString};
pub use error::{Error, Result};
pub use named_range::{NameScope, NamedRange, NamedRangeCollection};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
