//! Values produced and consumed during formula evaluation

use crate::error::{FormulaError, FormulaResult};
use sheetcalc_core::{CellError, CellValue};
use std::sync::Arc;

/// Value types during formula evaluation
///
/// Every consumer matches this enum exhaustively, so a new variant has to be
/// handled by the resolver, the comparator and the broadcaster alike.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
    /// An empty cell
    Blank,
    /// An omitted optional function argument, as in `IF(A1,,1)`
    MissingArgument,
    /// A rectangular block of values (a sheet range or an array constant)
    Area(Area),
    /// Several areas referenced together, e.g. `(A1:A2,C1:C2)` or `Sheet1:Sheet3!A1`
    Union(Vec<Area>),
}

impl Value {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Whether the value is a single cell's worth of data
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Area(_) | Value::Union(_))
    }

    /// Get the type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Error(_) => "error",
            Value::Blank => "blank",
            Value::MissingArgument => "missing argument",
            Value::Area(_) => "area",
            Value::Union(_) => "union",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<CellError> for Value {
    fn from(e: CellError) -> Self {
        Value::Error(e)
    }
}

impl From<Area> for Value {
    fn from(area: Area) -> Self {
        Value::Area(area)
    }
}

impl From<&CellValue> for Value {
    fn from(value: &CellValue) -> Self {
        match value.effective_value() {
            CellValue::Empty => Value::Blank,
            // Not a number any formula can compare or compute with
            CellValue::Number(n) if n.is_nan() => Value::Error(CellError::Num),
            CellValue::Number(n) => Value::Number(*n),
            CellValue::String(s) => Value::Text(s.as_str().to_string()),
            CellValue::Boolean(b) => Value::Boolean(*b),
            CellValue::Error(e) => Value::Error(*e),
            // effective_value never returns a formula
            CellValue::Formula { .. } => Value::Blank,
        }
    }
}

impl From<CellValue> for Value {
    fn from(value: CellValue) -> Self {
        Value::from(&value)
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Blank | Value::MissingArgument => CellValue::Empty,
            Value::Number(n) => CellValue::Number(n),
            Value::Text(s) => CellValue::string(s),
            Value::Boolean(b) => CellValue::Boolean(b),
            Value::Error(e) => CellValue::Error(e),
            Value::Area(_) | Value::Union(_) => CellValue::Error(CellError::Value),
        }
    }
}

/// Most cells an area may materialize
///
/// Whole-column and whole-sheet references exceed this; they are read as a
/// stored block padded with blanks instead.
pub const MAX_ARRAY_CELLS: u64 = 1 << 20;

static BLANK: Value = Value::Blank;

/// A rectangular, immutable grid of values with an absolute origin
///
/// Sheet ranges are anchored at their top-left cell; array constants at the cell
/// holding the formula. Only a block of the area is stored: every cell outside
/// it is blank. Cloning shares the backing storage.
#[derive(Debug, Clone)]
pub struct Area {
    first_row: u32,
    first_col: u16,
    height: u32,
    width: u16,
    // Offset and size of the stored block within the area
    data_row: u32,
    data_col: u16,
    data_height: u32,
    data_width: u16,
    cells: Arc<[Value]>,
}

impl Area {
    /// Build an area from rows of values
    ///
    /// Fails if there are no cells, the rows differ in width, or the area would
    /// extend past the largest addressable row or column.
    pub fn new(first_row: u32, first_col: u16, rows: Vec<Vec<Value>>) -> FormulaResult<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(invalid("area must contain at least one cell"));
        }
        if let Some(bad) = rows.iter().position(|row| row.len() != width) {
            return Err(invalid(format!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                width
            )));
        }

        let height = u32::try_from(rows.len()).map_err(|_| invalid("too many rows"))?;
        let width = u16::try_from(width).map_err(|_| invalid("too many columns"))?;
        let mut area = Self::blank(first_row, first_col, height, width)?;
        area.data_height = height;
        area.data_width = width;
        area.cells = rows.into_iter().flatten().collect();
        Ok(area)
    }

    /// An area of `height` x `width` blank cells, none of them stored
    pub fn blank(first_row: u32, first_col: u16, height: u32, width: u16) -> FormulaResult<Self> {
        if height == 0 || width == 0 {
            return Err(invalid("area must contain at least one cell"));
        }
        first_row
            .checked_add(height - 1)
            .ok_or_else(|| invalid("area extends past the last row"))?;
        first_col
            .checked_add(width - 1)
            .ok_or_else(|| invalid("area extends past the last column"))?;

        Ok(Self {
            first_row,
            first_col,
            height,
            width,
            data_row: 0,
            data_col: 0,
            data_height: 0,
            data_width: 0,
            cells: Arc::from(Vec::<Value>::new()),
        })
    }

    /// Store `rows` at (`row`, `col`), leaving the rest of the area blank
    ///
    /// The block must lie inside the area.
    pub fn with_cells(self, row: u32, col: u16, rows: Vec<Vec<Value>>) -> FormulaResult<Self> {
        let block = Self::new(row, col, rows)?;
        let inside = self.contains_row(block.first_row)
            && self.contains_row(block.last_row())
            && self.contains_column(block.first_col)
            && self.contains_column(block.last_column());
        if !inside {
            return Err(invalid("stored block lies outside the area"));
        }

        Ok(Self {
            data_row: block.first_row - self.first_row,
            data_col: block.first_col - self.first_col,
            data_height: block.height,
            data_width: block.width,
            cells: block.cells,
            ..self
        })
    }

    /// A 1x1 area holding one value
    pub fn single(row: u32, col: u16, value: Value) -> Self {
        Self {
            first_row: row,
            first_col: col,
            height: 1,
            width: 1,
            data_row: 0,
            data_col: 0,
            data_height: 1,
            data_width: 1,
            cells: Arc::from(vec![value]),
        }
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn first_column(&self) -> u16 {
        self.first_col
    }

    pub fn last_row(&self) -> u32 {
        self.first_row + (self.height - 1)
    }

    pub fn last_column(&self) -> u16 {
        self.first_col + (self.width - 1)
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// Number of cells covered, stored or not
    pub fn cell_count(&self) -> u64 {
        self.height as u64 * self.width as u64
    }

    /// Exactly one row tall
    pub fn is_row(&self) -> bool {
        self.height == 1
    }

    /// Exactly one column wide
    pub fn is_column(&self) -> bool {
        self.width == 1
    }

    pub fn contains_row(&self, row: u32) -> bool {
        (self.first_row..=self.last_row()).contains(&row)
    }

    pub fn contains_column(&self, col: u16) -> bool {
        (self.first_col..=self.last_column()).contains(&col)
    }

    /// Value at a sheet position, if the area covers it
    pub fn absolute_value(&self, row: u32, col: u16) -> Option<&Value> {
        if !self.contains_row(row) || !self.contains_column(col) {
            return None;
        }
        self.relative_value(row - self.first_row, col - self.first_col)
    }

    /// Value at an offset from the area's top-left cell
    pub fn relative_value(&self, row: u32, col: u16) -> Option<&Value> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let (Some(r), Some(c)) = (row.checked_sub(self.data_row), col.checked_sub(self.data_col))
        else {
            return Some(&BLANK);
        };
        if r >= self.data_height || c >= self.data_width {
            return Some(&BLANK);
        }
        self.cells
            .get(r as usize * self.data_width as usize + c as usize)
    }

    /// Iterate every cell in row-major order with absolute positions
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &Value)> + '_ {
        (0..self.height).flat_map(move |i| {
            (0..self.width).map(move |j| {
                let value = self.relative_value(i, j).unwrap_or(&BLANK);
                (self.first_row + i, self.first_col + j, value)
            })
        })
    }

    /// The stored values, row by row
    ///
    /// This is every cell unless the area was built with [`Area::blank`] or
    /// [`Area::with_cells`]; the cells left out are blank.
    pub fn values(&self) -> &[Value] {
        &self.cells
    }
}

impl PartialEq for Area {
    fn eq(&self, other: &Self) -> bool {
        let extent = |a: &Area| (a.first_row, a.first_col, a.height, a.width);
        extent(self) == extent(other)
            && self.iter().zip(other.iter()).all(|(a, b)| a.2 == b.2)
    }
}

fn invalid(detail: impl Into<String>) -> FormulaError {
    FormulaError::InvalidArgument {
        operation: "Area",
        detail: detail.into(),
    }
}
