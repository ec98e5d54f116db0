//! Formula parser
//!
//! A recursive descent parser for Excel formulas with proper operator precedence.

use crate::ast::{
    BinaryOperator, CellReference, FormulaExpr, RangeReference, SheetReference, UnaryOperator,
};
use crate::error::{FormulaError, FormulaResult};
use lazy_regex::regex_is_match;
use sheetcalc_core::{CellAddress, CellError, CellRange};

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use sheetcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM('my sheet'!A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,,\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();

    // Formula must start with '='
    let formula = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    let mut parser = FormulaParser::new(formula);
    let expr = parser.parse_expression()?;

    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    // Identifiers and references
    Identifier(String),       // Function name or named range
    CellRef(String),          // Cell reference like A1, $A$1
    SheetRef(SheetReference), // Sheet prefix like Sheet1!, 'my sheet'!, [1]Sheet1:Sheet3!

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    /// Text that could not be scanned
    Invalid(String),

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.current_token = self.scan_token();
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Token::Eof;
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        match c {
            '<' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::GreaterThan
                }
            }
            '"' => self.scan_string(),
            '\'' => self.scan_quoted_sheet(),
            '[' => self.scan_external_sheet(),
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                self.scan_number()
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '\\' || c == '$' || c == '#' => {
                self.scan_identifier_or_ref()
            }
            other => {
                self.advance();
                Token::Invalid(other.to_string())
            }
        }
    }

    fn scan_string(&mut self) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => return Token::Invalid(format!("\"{}", s)),
                Some('"') => {
                    self.advance();
                    // "" is an escaped quote
                    if self.peek_char() != Some('"') {
                        return Token::String(s);
                    }
                    s.push('"');
                    self.advance();
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        self.skip_digits();
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.skip_digits();
        }

        let text = &self.input[start..self.pos];
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Token::Number(n),
            _ => Token::Invalid(text.to_string()),
        }
    }

    /// `'my sheet'!`, `'O''Brian'!`, `'[1]Sheet 1:Sheet 3'!`
    fn scan_quoted_sheet(&mut self) -> Token {
        self.advance(); // Skip opening quote

        let mut name = String::new();
        loop {
            match self.peek_char() {
                None => return Token::Invalid(format!("'{}", name)),
                Some('\'') => {
                    self.advance();
                    // '' is an escaped quote
                    if self.peek_char() != Some('\'') {
                        break;
                    }
                    name.push('\'');
                    self.advance();
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
            }
        }

        if self.peek_char() != Some('!') {
            return Token::Invalid(format!("'{}'", name));
        }
        self.advance();
        parse_sheet_text(&name).map_or_else(|| Token::Invalid(name.clone()), Token::SheetRef)
    }

    /// `[1]Sheet1!` or `[1]Sheet1:Sheet3!`
    fn scan_external_sheet(&mut self) -> Token {
        let start = self.pos;
        while self.peek_char().map_or(false, |c| {
            c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | ':')
        }) {
            self.advance();
        }
        let text = &self.input[start..self.pos];

        if self.peek_char() != Some('!') {
            return Token::Invalid(text.to_string());
        }
        self.advance();
        parse_sheet_text(text).map_or_else(|| Token::Invalid(text.to_string()), Token::SheetRef)
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;

        // Error values (#VALUE!, #REF!, etc.)
        if self.peek_char() == Some('#') {
            self.advance();
            while self.peek_char().map_or(false, |c| {
                c.is_ascii_alphanumeric() || matches!(c, '!' | '/' | '?' | '_')
            }) {
                self.advance();
            }
            let error_str = &self.input[start..self.pos];
            return match CellError::parse(error_str) {
                Some(err) => Token::Error(err),
                None => Token::Invalid(error_str.to_string()),
            };
        }

        self.skip_identifier_chars();
        let text = &self.input[start..self.pos];

        // Sheet prefix (Sheet1!)
        if self.peek_char() == Some('!') {
            self.advance();
            return Token::SheetRef(SheetReference::local(text));
        }

        // 3-D sheet prefix (Sheet1:Sheet3!), otherwise leave the ':' for a range
        if self.peek_char() == Some(':') {
            let saved = self.pos;
            self.advance();
            let last_start = self.pos;
            self.skip_identifier_chars();
            let last = &self.input[last_start..self.pos];
            if !last.is_empty() && self.peek_char() == Some('!') {
                self.advance();
                return Token::SheetRef(SheetReference {
                    workbook_index: None,
                    first_sheet: text.to_string(),
                    last_sheet: Some(last.to_string()),
                });
            }
            self.pos = saved;
        }

        // TRUE( and FALSE( are function calls
        let is_call = self.peek_char() == Some('(');
        if !is_call && text.eq_ignore_ascii_case("TRUE") {
            return Token::Boolean(true);
        }
        if !is_call && text.eq_ignore_ascii_case("FALSE") {
            return Token::Boolean(false);
        }

        // LOG10( is a function call, not a cell
        if !is_call && Self::is_cell_reference(text) {
            return Token::CellRef(text.to_string());
        }

        Token::Identifier(text.to_string())
    }

    fn is_cell_reference(text: &str) -> bool {
        regex_is_match!(r"^\$?[A-Za-z]{1,3}\$?[0-9]+$", text)
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_identifier_chars(&mut self) {
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || matches!(c, '_' | '\\' | '$' | '.'))
        {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> Token {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Prefix: -, +
    // 7. Postfix: %
    // 8. Range: :
    // 9. Primary: literals, references, function calls, parentheses (with union)

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current_token(), Token::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        // Left associative, like every other binary operator
        while matches!(self.current_token(), Token::Caret) {
            self.consume();
            let right = self.parse_unary()?;
            left = binary(BinaryOperator::Power, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let prefix = match self.current_token() {
            Token::Minus => Some(UnaryOperator::Negate),
            Token::Plus => Some(UnaryOperator::Plus),
            _ => None,
        };
        if let Some(op) = prefix {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(FormulaExpr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }

        let mut expr = self.parse_range()?;

        while matches!(self.current_token(), Token::Percent) {
            self.consume();
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if !matches!(self.current_token(), Token::Colon) {
            return Ok(left);
        }
        self.consume();
        let right = self.parse_primary()?;

        match (left, right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                // Sheet1!A1:B2 and Sheet1!A1:Sheet1!B2 are both fine
                if end.sheet.is_some() && end.sheet != start.sheet {
                    return Err(FormulaError::Parse(
                        "Range references must be on the same sheet".into(),
                    ));
                }
                Ok(FormulaExpr::RangeRef(RangeReference {
                    sheet: start.sheet,
                    range: CellRange::new(start.address, end.address),
                }))
            }
            _ => Err(FormulaError::Parse(
                "Range operator ':' needs a cell reference on each side".into(),
            )),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(FormulaExpr::Number(n))
            }

            Token::String(s) => {
                self.consume();
                Ok(FormulaExpr::String(s))
            }

            Token::Boolean(b) => {
                self.consume();
                Ok(FormulaExpr::Boolean(b))
            }

            Token::Error(e) => {
                self.consume();
                Ok(FormulaExpr::Error(e))
            }

            Token::LeftParen => {
                self.consume();
                let mut expr = self.parse_expression()?;
                // (A1:A2,C1:C2)
                while matches!(self.current_token(), Token::Comma) {
                    self.consume();
                    let right = self.parse_expression()?;
                    expr = binary(BinaryOperator::Union, expr, right);
                }
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::LeftBrace => self.parse_array(),

            Token::SheetRef(sheet) => {
                self.consume();
                self.parse_sheet_reference(sheet)
            }

            Token::CellRef(ref_str) => {
                self.consume();
                parse_cell_reference(None, &ref_str)
            }

            Token::Identifier(name) => {
                self.consume();
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name))
                }
            }

            Token::Invalid(text) => Err(FormulaError::Parse(format!(
                "Unrecognized input '{}'",
                text
            ))),

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_array(&mut self) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftBrace)?;

        let mut rows = Vec::new();
        let mut current_row = vec![self.parse_expression()?];
        loop {
            match self.current_token() {
                Token::Comma => {
                    self.consume();
                    current_row.push(self.parse_expression()?);
                }
                Token::Semicolon => {
                    self.consume();
                    rows.push(std::mem::take(&mut current_row));
                    current_row.push(self.parse_expression()?);
                }
                Token::RightBrace => break,
                _ => {
                    return Err(FormulaError::Parse(
                        "Expected ',' ';' or '}' in array".into(),
                    ))
                }
            }
        }
        rows.push(current_row);
        self.expect(&Token::RightBrace)?;

        let width = rows[0].len();
        if rows.iter().any(|row| row.len() != width) {
            return Err(FormulaError::Parse(
                "Array constant rows must all have the same number of values".into(),
            ));
        }
        Ok(FormulaExpr::Array(rows))
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        if !matches!(self.current_token(), Token::RightParen) {
            loop {
                // IF(A1,,1) leaves the second argument out
                if matches!(self.current_token(), Token::Comma | Token::RightParen) {
                    args.push(FormulaExpr::Missing);
                } else {
                    args.push(self.parse_expression()?);
                }

                if !matches!(self.current_token(), Token::Comma) {
                    break;
                }
                self.consume();
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }

    fn parse_sheet_reference(&mut self, sheet: SheetReference) -> FormulaResult<FormulaExpr> {
        // After Sheet1!, we expect a cell reference
        match self.current_token().clone() {
            Token::CellRef(ref_str) => {
                self.consume();
                parse_cell_reference(Some(sheet), &ref_str)
            }
            _ => Err(FormulaError::Parse(format!(
                "Expected cell reference after {}!",
                sheet
            ))),
        }
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn parse_cell_reference(sheet: Option<SheetReference>, ref_str: &str) -> FormulaResult<FormulaExpr> {
    let address = CellAddress::parse(ref_str).map_err(|e| {
        FormulaError::Parse(format!("Invalid cell reference '{}': {}", ref_str, e))
    })?;

    Ok(FormulaExpr::CellRef(CellReference { sheet, address }))
}

/// Split `[1]First:Last` into its parts
fn parse_sheet_text(text: &str) -> Option<SheetReference> {
    let (workbook_index, names) = match text.strip_prefix('[') {
        Some(rest) => {
            let (index, names) = rest.split_once(']')?;
            (Some(index.parse::<u32>().ok()?), names)
        }
        None => (None, text),
    };
    let (first, last) = match names.split_once(':') {
        Some((first, last)) => (first, Some(last)),
        None => (names, None),
    };
    if first.is_empty() || last.map_or(false, str::is_empty) {
        return None;
    }
    Some(SheetReference {
        workbook_index,
        first_sheet: first.to_string(),
        last_sheet: last.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(sheet: Option<SheetReference>, a1: &str) -> FormulaExpr {
        FormulaExpr::CellRef(CellReference {
            sheet,
            address: CellAddress::parse(a1).unwrap(),
        })
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), FormulaExpr::Number(42.0));
        assert_eq!(parse_formula("=3.25").unwrap(), FormulaExpr::Number(3.25));
        assert_eq!(parse_formula("=1e10").unwrap(), FormulaExpr::Number(1e10));
        assert_eq!(parse_formula("=.5").unwrap(), FormulaExpr::Number(0.5));
        assert!(parse_formula("=1e").is_err());
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse_formula("=\"Hello \"\"World\"\"\"").unwrap(),
            FormulaExpr::String("Hello \"World\"".into())
        );
        assert!(parse_formula("=\"unterminated").is_err());
    }

    #[test]
    fn test_parse_boolean_and_error() {
        assert_eq!(parse_formula("=TRUE").unwrap(), FormulaExpr::Boolean(true));
        assert_eq!(parse_formula("=false").unwrap(), FormulaExpr::Boolean(false));
        assert_eq!(
            parse_formula("=#DIV/0!").unwrap(),
            FormulaExpr::Error(CellError::Div0)
        );
        assert_eq!(parse_formula("=#N/A").unwrap(), FormulaExpr::Error(CellError::Na));
        assert!(parse_formula("=#BOGUS!").is_err());
    }

    #[test]
    fn test_parse_precedence() {
        let ast = parse_formula("=1+2*3").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Add,
                FormulaExpr::Number(1.0),
                binary(
                    BinaryOperator::Multiply,
                    FormulaExpr::Number(2.0),
                    FormulaExpr::Number(3.0)
                )
            )
        );

        // Negation binds tighter than ^
        let ast = parse_formula("=-2^2").unwrap();
        assert!(matches!(
            ast,
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                ..
            }
        ));

        // 2^3^2 is (2^3)^2
        assert_eq!(
            parse_formula("=2^3^2").unwrap(),
            binary(
                BinaryOperator::Power,
                binary(
                    BinaryOperator::Power,
                    FormulaExpr::Number(2.0),
                    FormulaExpr::Number(3.0)
                ),
                FormulaExpr::Number(2.0)
            )
        );
    }

    #[test]
    fn test_parse_unary() {
        assert!(matches!(
            parse_formula("=+A1").unwrap(),
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Plus,
                ..
            }
        ));
        assert!(matches!(
            parse_formula("=50%").unwrap(),
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_cell_reference() {
        assert_eq!(parse_formula("=A1").unwrap(), cell(None, "A1"));

        let FormulaExpr::CellRef(cell_ref) = parse_formula("=$B$2").unwrap() else {
            panic!("Expected CellRef");
        };
        assert_eq!((cell_ref.address.row, cell_ref.address.col), (1, 1));
        assert!(cell_ref.address.row_absolute && cell_ref.address.col_absolute);
    }

    #[test]
    fn test_parse_sheet_references() {
        assert_eq!(
            parse_formula("=Sheet2!B3").unwrap(),
            cell(Some(SheetReference::local("Sheet2")), "B3")
        );
        assert_eq!(
            parse_formula("='my sheet'!A1").unwrap(),
            cell(Some(SheetReference::local("my sheet")), "A1")
        );
        assert_eq!(
            parse_formula("='O''Brian'!A1").unwrap(),
            cell(Some(SheetReference::local("O'Brian")), "A1")
        );
    }

    #[test]
    fn test_parse_3d_and_external_references() {
        let three_d = SheetReference {
            workbook_index: None,
            first_sheet: "Sheet1".into(),
            last_sheet: Some("Sheet3".into()),
        };
        assert_eq!(
            parse_formula("=Sheet1:Sheet3!A1").unwrap(),
            cell(Some(three_d), "A1")
        );

        let external = SheetReference {
            workbook_index: Some(1),
            first_sheet: "Prices".into(),
            last_sheet: None,
        };
        assert_eq!(
            parse_formula("=[1]Prices!A1").unwrap(),
            cell(Some(external), "A1")
        );

        let quoted_external = SheetReference {
            workbook_index: Some(2),
            first_sheet: "my sheet".into(),
            last_sheet: None,
        };
        assert_eq!(
            parse_formula("='[2]my sheet'!A1").unwrap(),
            cell(Some(quoted_external), "A1")
        );
    }

    #[test]
    fn test_parse_range_reference() {
        let FormulaExpr::RangeRef(range_ref) = parse_formula("=Sheet1!B10:A1").unwrap() else {
            panic!("Expected RangeRef");
        };
        assert_eq!(range_ref.sheet, Some(SheetReference::local("Sheet1")));
        assert_eq!(range_ref.range.to_string(), "A1:B10");

        assert!(parse_formula("=Sheet1!A1:Sheet2!B2").is_err());
        assert!(parse_formula("=A1:5").is_err());
    }

    #[test]
    fn test_parse_function_with_missing_arguments() {
        let ast = parse_formula("=IF(A1,,1)").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::Function {
                name: "IF".into(),
                args: vec![cell(None, "A1"), FormulaExpr::Missing, FormulaExpr::Number(1.0)],
            }
        );

        let FormulaExpr::Function { args, .. } = parse_formula("=f(1,)").unwrap() else {
            panic!("Expected Function");
        };
        assert_eq!(args, vec![FormulaExpr::Number(1.0), FormulaExpr::Missing]);

        let FormulaExpr::Function { args, .. } = parse_formula("=NOW()").unwrap() else {
            panic!("Expected Function");
        };
        assert!(args.is_empty());
    }

    #[test]
    fn test_parse_function_names() {
        let FormulaExpr::Function { name, .. } = parse_formula("=log10(100)").unwrap() else {
            panic!("Expected Function");
        };
        assert_eq!(name, "LOG10");
        assert!(matches!(
            parse_formula("=TRUE()").unwrap(),
            FormulaExpr::Function { .. }
        ));
    }

    #[test]
    fn test_parse_union() {
        let ast = parse_formula("=SUM((A1:A2,C1))").unwrap();
        let FormulaExpr::Function { args, .. } = ast else {
            panic!("Expected Function");
        };
        assert!(matches!(
            args[0],
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Union,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_array() {
        let FormulaExpr::Array(rows) = parse_formula("={1,2;3,4}").unwrap() else {
            panic!("Expected Array");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 2);

        assert!(parse_formula("={1,2;3}").is_err());
        assert!(parse_formula("={}").is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            parse_formula("=TaxRate*2").unwrap(),
            binary(
                BinaryOperator::Multiply,
                FormulaExpr::NameRef("TaxRate".into()),
                FormulaExpr::Number(2.0)
            )
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_formula("1+2").is_err());
        assert!(parse_formula("=1+").is_err());
        assert!(parse_formula("=1 2").is_err());
        assert!(parse_formula("=(1").is_err());
        assert!(parse_formula("=1~2").is_err());
        assert!(parse_formula("='unterminated!A1").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "=1+2*3",
            "=(1+2)*3",
            "=-2^2",
            "=2^3^2",
            "=2^(3^2)",
            "=SUM('my sheet'!$A$1:B2,Sheet2!C3)",
            "='O''Brian'!A1&\"x\"",
            "=IF(A1,,\"No\")",
            "=[1]Prices!A1",
            "='[0]my sheet'!A1",
            "=Sheet1:Sheet3!A1",
            "=SUM((A1:A2,C1:C2,E1))",
            "={1,2;3,4}",
            "=50%*-A1",
            "=A1<>B1",
        ] {
            let ast = parse_formula(text).unwrap();
            assert_eq!(format!("={}", ast), text);
        }
    }
}
