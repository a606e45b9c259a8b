//! Token and source position types produced by the lexer.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Error,
    Eof,
    Ident,
    Number,
    String,
    True,
    False,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    In,
    Like,
    LParen,
    RParen,
    LBrack,
    RBrack,
    Comma,
}

impl TokenKind {
    /// Resolves a scanned word to its keyword kind. Keywords are case-insensitive.
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word.to_ascii_lowercase().as_str() {
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "in" => Self::In,
            "like" => Self::Like,
            "true" => Self::True,
            "false" => Self::False,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_literal(self) -> bool {
        matches!(self, Self::Number | Self::String | Self::True | Self::False)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Eof => "EOF",
            Self::Ident => "IDENT",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Like => "LIKE",
            Self::LParen => "LPAREN",
            Self::RParen => "RPAREN",
            Self::LBrack => "LBRACK",
            Self::RBrack => "RBRACK",
            Self::Comma => "COMMA",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a token in the source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-based and count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text, except for `String` tokens which carry the unescaped value.
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            kind => write!(f, "{kind} '{}'", self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(TokenKind::keyword("AnD"), Some(TokenKind::And));
        assert_eq!(TokenKind::keyword("LIKE"), Some(TokenKind::Like));
        assert_eq!(TokenKind::keyword("True"), Some(TokenKind::True));
        assert_eq!(TokenKind::keyword("android"), None);
    }

    #[test]
    fn tokens_render_kind_and_text() {
        let token = Token::new(TokenKind::Ident, "price", Position::start());
        assert_eq!(token.to_string(), "IDENT 'price'");
        assert_eq!(
            Token::new(TokenKind::Eof, "", Position::start()).to_string(),
            "end of input"
        );
    }
}
