//! Recursive-descent parser with one function per precedence level.
//!
//! From loosest to tightest: `OR`, `AND`, `NOT`, comparisons, `IN`/`LIKE`, then indexing.
//! Binary levels fold left to right; `NOT` nests to the right.

use crate::{
    BinaryOp, Expr, FilterError, FilterErrorKind, Lexer, Literal, LiteralKind, Number, Token,
    TokenKind,
};

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    eof: Token,
}

impl Parser {
    pub fn new(text: &str) -> Self {
        let tokens = Lexer::new(text).collect::<Vec<_>>();
        let eof = tokens
            .last()
            .filter(|token| token.kind == TokenKind::Eof)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", Default::default()));

        Self {
            tokens,
            cursor: 0,
            eof,
        }
    }

    /// Parses the whole input as a single expression.
    pub fn parse(mut self) -> Result<Expr, FilterError> {
        let expr = self.parse_or()?;
        if self.peek().kind != TokenKind::Eof {
            return Err(self.unexpected("expected end of input"));
        }
        Ok(expr)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.cursor).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.cursor += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, FilterError> {
        if self.peek().kind == kind {
            return Ok(self.advance());
        }
        Err(self.unexpected(format!("expected {kind}")))
    }

    /// Reports the current token, classifying lexer errors and end of input separately.
    fn unexpected(&self, detail: impl std::fmt::Display) -> FilterError {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Error => FilterErrorKind::InvalidToken,
            TokenKind::Eof => FilterErrorKind::UnexpectedEof,
            _ => FilterErrorKind::UnexpectedToken,
        };
        FilterError::new(kind, token, detail)
    }

    fn parse_or(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_not()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_not()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, FilterError> {
        if self.eat(TokenKind::Not) {
            return Ok(Expr::not(self.parse_not()?));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_matching()?;
        while let Some(op) = comparison_op(self.peek().kind) {
            self.advance();
            let right = self.parse_operand()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_matching(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_primary()?;
        while let Some(op) = matching_op(self.peek().kind) {
            self.advance();
            let right = self.parse_operand()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, FilterError> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::Ident => {
                let token = self.advance();
                let mut expr = Expr::ident(token.text);
                while self.eat(TokenKind::LBrack) {
                    let index = self.parse_index()?;
                    self.expect(TokenKind::RBrack)?;
                    expr = Expr::index(expr, index);
                }
                Ok(expr)
            }
            TokenKind::LParen => {
                self.advance();
                if self.peek().kind == TokenKind::RParen {
                    return Err(self.empty_parentheses());
                }
                let expr = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            kind if kind.is_literal() => Ok(Expr::literal(self.parse_literal()?)),
            _ => Err(self.unexpected("expected identifier, literal or '('")),
        }
    }

    fn parse_index(&mut self) -> Result<Literal, FilterError> {
        match self.peek().kind {
            TokenKind::Number | TokenKind::String => self.parse_literal(),
            TokenKind::True | TokenKind::False => Err(FilterError::new(
                FilterErrorKind::InvalidIndexType,
                self.peek().clone(),
                "index must be a number or string",
            )),
            _ => Err(self.unexpected("expected index")),
        }
    }

    fn parse_operand(&mut self) -> Result<Expr, FilterError> {
        if !self.eat(TokenKind::LParen) {
            return Ok(Expr::literal(self.parse_literal()?));
        }

        if self.peek().kind == TokenKind::RParen {
            return Err(self.empty_parentheses());
        }

        let first = self.parse_literal()?;
        let expected = first.kind();
        let mut items = vec![first];

        while self.eat(TokenKind::Comma) {
            if self.peek().kind == TokenKind::RParen {
                return Err(FilterError::new(
                    FilterErrorKind::TrailingComma,
                    self.peek().clone(),
                    "trailing comma in list",
                ));
            }

            let token = self.peek().clone();
            let item = self.parse_literal()?;
            if item.kind() != expected {
                return Err(FilterError::new(
                    FilterErrorKind::TypeMismatch,
                    token,
                    format!(
                        "list elements must all be {}",
                        literal_kind_name(expected)
                    ),
                ));
            }
            items.push(item);
        }

        self.expect(TokenKind::RParen)?;
        Ok(Expr::list(items))
    }

    fn parse_literal(&mut self) -> Result<Literal, FilterError> {
        let literal = match self.peek().kind {
            TokenKind::Number => {
                let number = Number::parse(&self.peek().text).ok_or_else(|| {
                    FilterError::new(
                        FilterErrorKind::InvalidToken,
                        self.peek().clone(),
                        "malformed number",
                    )
                })?;
                Literal::Number(number)
            }
            TokenKind::String => Literal::String(self.peek().text.clone()),
            TokenKind::True => Literal::Bool(true),
            TokenKind::False => Literal::Bool(false),
            _ => return Err(self.unexpected("expected literal")),
        };
        self.advance();
        Ok(literal)
    }

    fn empty_parentheses(&self) -> FilterError {
        FilterError::new(
            FilterErrorKind::EmptyParentheses,
            self.peek().clone(),
            "empty parentheses",
        )
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::Ne => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        _ => return None,
    };
    Some(op)
}

fn matching_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::In => Some(BinaryOp::In),
        TokenKind::Like => Some(BinaryOp::Like),
        _ => None,
    }
}

fn literal_kind_name(kind: LiteralKind) -> &'static str {
    match kind {
        LiteralKind::Number => "numbers",
        LiteralKind::String => "strings",
        LiteralKind::Bool => "booleans",
    }
}

/// Parses `text` into an expression tree.
///
/// ```rust
/// use ffilter::{BinaryOp, Expr, parse};
///
/// let expr = parse("status == 'open' AND NOT archived").expect("valid filter");
/// assert_eq!(
///     expr,
///     Expr::binary(
///         BinaryOp::And,
///         Expr::binary(BinaryOp::Eq, Expr::ident("status"), Expr::literal("open")),
///         Expr::not(Expr::ident("archived")),
///     )
/// );
/// ```
pub fn parse(text: &str) -> Result<Expr, FilterError> {
    Parser::new(text).parse()
}
