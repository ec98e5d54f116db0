//! Formula Abstract Syntax Tree types
//!
//! `Display` turns an expression back into formula text (without the leading `=`),
//! adding parentheses only where precedence requires them.

use crate::compare::RelationalOperator;
use crate::operators::NumericOperator;
pub use crate::operators::UnaryOperator;
use crate::resolver::format_number;
use crate::sheet_name::append_sheet_range;
use sheetcalc_core::{CellAddress, CellError, CellRange};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(CellError),
    /// An omitted function argument
    Missing,

    // === References ===
    /// Single cell reference
    CellRef(CellReference),
    /// Range reference
    RangeRef(RangeReference),
    /// Named range or defined name
    NameRef(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },

    // === Array ===
    /// Array constant; rows always have equal length
    Array(Vec<Vec<FormulaExpr>>),
}

/// The sheet part of a reference: `Sheet1`, `Sheet1:Sheet3`, `[1]Sheet1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReference {
    /// External workbook index, if the reference points outside this workbook
    pub workbook_index: Option<u32>,
    pub first_sheet: String,
    /// Last sheet of a 3-D reference
    pub last_sheet: Option<String>,
}

impl SheetReference {
    /// A plain reference to one sheet of this workbook
    pub fn local<S: Into<String>>(name: S) -> Self {
        Self {
            workbook_index: None,
            first_sheet: name.into(),
            last_sheet: None,
        }
    }
}

impl fmt::Display for SheetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self
            .workbook_index
            .map_or(-1, |i| i32::try_from(i).unwrap_or(i32::MAX));
        let mut out = String::new();
        append_sheet_range(
            &mut out,
            index,
            Some(&self.first_sheet),
            self.last_sheet.as_deref(),
        );
        f.write_str(&out)
    }
}

/// Cell reference with optional sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CellReference {
    pub sheet: Option<SheetReference>,
    pub address: CellAddress,
}

/// Range reference with optional sheet
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReference {
    pub sheet: Option<SheetReference>,
    pub range: CellRange,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,

    // Reference
    Union,
}

impl BinaryOperator {
    /// The arithmetic operator this stands for, if any
    pub fn numeric(self) -> Option<NumericOperator> {
        match self {
            BinaryOperator::Add => Some(NumericOperator::Add),
            BinaryOperator::Subtract => Some(NumericOperator::Subtract),
            BinaryOperator::Multiply => Some(NumericOperator::Multiply),
            BinaryOperator::Divide => Some(NumericOperator::Divide),
            BinaryOperator::Power => Some(NumericOperator::Power),
            _ => None,
        }
    }

    /// The comparison operator this stands for, if any
    pub fn relational(self) -> Option<RelationalOperator> {
        match self {
            BinaryOperator::Equal => Some(RelationalOperator::Equal),
            BinaryOperator::NotEqual => Some(RelationalOperator::NotEqual),
            BinaryOperator::LessThan => Some(RelationalOperator::LessThan),
            BinaryOperator::LessEqual => Some(RelationalOperator::LessEqual),
            BinaryOperator::GreaterThan => Some(RelationalOperator::GreaterThan),
            BinaryOperator::GreaterEqual => Some(RelationalOperator::GreaterEqual),
            _ => None,
        }
    }

    /// Operator text as written in a formula
    pub fn symbol(self) -> &'static str {
        if let Some(op) = self.numeric() {
            return op.symbol();
        }
        if let Some(op) = self.relational() {
            return op.symbol();
        }
        match self {
            BinaryOperator::Concat => "&",
            _ => ",",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Union => 0,
            BinaryOperator::Concat => 2,
            BinaryOperator::Add | BinaryOperator::Subtract => 3,
            BinaryOperator::Multiply | BinaryOperator::Divide => 4,
            BinaryOperator::Power => 5,
            _ => 1,
        }
    }
}

const PREFIX_PRECEDENCE: u8 = 6;
const PERCENT_PRECEDENCE: u8 = 7;
const ATOM_PRECEDENCE: u8 = 8;

impl FormulaExpr {
    fn precedence(&self) -> u8 {
        match self {
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Union,
                ..
            } => ATOM_PRECEDENCE,
            FormulaExpr::BinaryOp { op, .. } => op.precedence(),
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                ..
            } => PERCENT_PRECEDENCE,
            FormulaExpr::UnaryOp { .. } => PREFIX_PRECEDENCE,
            _ => ATOM_PRECEDENCE,
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }

    // Members of a union are written without the parentheses of nested unions
    fn write_union_member(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Union,
                left,
                right,
            } => {
                left.write_union_member(f)?;
                f.write_str(",")?;
                right.write_union_member(f)
            }
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => f.write_str(&format_number(*n)),
            FormulaExpr::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            FormulaExpr::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            FormulaExpr::Error(e) => f.write_str(e.as_str()),
            FormulaExpr::Missing => Ok(()),

            FormulaExpr::CellRef(r) => {
                if let Some(sheet) = &r.sheet {
                    write!(f, "{}!", sheet)?;
                }
                write!(f, "{}", r.address)
            }
            FormulaExpr::RangeRef(r) => {
                if let Some(sheet) = &r.sheet {
                    write!(f, "{}!", sheet)?;
                }
                write!(f, "{}:{}", r.range.start, r.range.end)
            }
            FormulaExpr::NameRef(name) => f.write_str(name),

            FormulaExpr::BinaryOp {
                op: BinaryOperator::Union,
                ..
            } => {
                f.write_str("(")?;
                self.write_union_member(f)?;
                f.write_str(")")
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                // Every binary operator groups to the left
                let p = op.precedence();
                left.write_operand(f, left.precedence() < p)?;
                f.write_str(op.symbol())?;
                right.write_operand(f, right.precedence() <= p)
            }
            FormulaExpr::UnaryOp { op, operand } => match op {
                UnaryOperator::Percent => {
                    operand.write_operand(f, operand.precedence() < PERCENT_PRECEDENCE)?;
                    f.write_str("%")
                }
                UnaryOperator::Negate | UnaryOperator::Plus => {
                    f.write_str(if *op == UnaryOperator::Negate { "-" } else { "+" })?;
                    operand.write_operand(f, operand.precedence() < PREFIX_PRECEDENCE)
                }
            },

            FormulaExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            FormulaExpr::Array(rows) => {
                f.write_str("{")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    for (j, value) in row.iter().enumerate() {
                        if j > 0 {
                            f.write_str(",")?;
                        }
                        write!(f, "{}", value)?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<FormulaExpr> {
        Box::new(FormulaExpr::Number(n))
    }

    fn binary(op: BinaryOperator, left: Box<FormulaExpr>, right: Box<FormulaExpr>) -> Box<FormulaExpr> {
        Box::new(FormulaExpr::BinaryOp { op, left, right })
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(FormulaExpr::Number(1.5).to_string(), "1.5");
        assert_eq!(FormulaExpr::String("say \"hi\"".into()).to_string(), "\"say \"\"hi\"\"\"");
        assert_eq!(FormulaExpr::Boolean(false).to_string(), "FALSE");
        assert_eq!(FormulaExpr::Error(CellError::Na).to_string(), "#N/A");
    }

    #[test]
    fn test_display_parenthesizes_by_precedence() {
        let sum = binary(BinaryOperator::Add, num(1.0), num(2.0));
        let product = binary(BinaryOperator::Multiply, sum, num(3.0));
        assert_eq!(product.to_string(), "(1+2)*3");

        let difference = binary(
            BinaryOperator::Subtract,
            num(1.0),
            binary(BinaryOperator::Subtract, num(2.0), num(3.0)),
        );
        assert_eq!(difference.to_string(), "1-(2-3)");

        let power = binary(
            BinaryOperator::Power,
            binary(BinaryOperator::Power, num(2.0), num(3.0)),
            num(2.0),
        );
        assert_eq!(power.to_string(), "2^3^2");

        let nested_exponent = binary(
            BinaryOperator::Power,
            num(2.0),
            binary(BinaryOperator::Power, num(3.0), num(2.0)),
        );
        assert_eq!(nested_exponent.to_string(), "2^(3^2)");
    }

    #[test]
    fn test_display_unary() {
        let negated_power = FormulaExpr::UnaryOp {
            op: UnaryOperator::Negate,
            operand: binary(BinaryOperator::Power, num(2.0), num(2.0)),
        };
        assert_eq!(negated_power.to_string(), "-(2^2)");

        let percent = FormulaExpr::UnaryOp {
            op: UnaryOperator::Percent,
            operand: num(50.0),
        };
        assert_eq!(percent.to_string(), "50%");
    }

    #[test]
    fn test_display_sheet_references() {
        let reference = FormulaExpr::CellRef(CellReference {
            sheet: Some(SheetReference::local("my sheet")),
            address: CellAddress::absolute(0, 0),
        });
        assert_eq!(reference.to_string(), "'my sheet'!$A$1");

        let external = FormulaExpr::RangeRef(RangeReference {
            sheet: Some(SheetReference {
                workbook_index: Some(1),
                first_sheet: "Data".into(),
                last_sheet: Some("Summary".into()),
            }),
            range: CellRange::parse("A1:B2").unwrap(),
        });
        assert_eq!(external.to_string(), "[1]Data:Summary!A1:B2");
    }
}
