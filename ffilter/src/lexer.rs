//! Character scanner turning filter text into tokens.
//!
//! The lexer never fails: malformed input becomes an [`TokenKind::Error`] token positioned at
//! the first offending character, and the parser decides how to report it. Iteration ends
//! after the single [`TokenKind::Eof`] token.
//!
//! ```rust
//! use ffilter::{Lexer, TokenKind};
//!
//! let kinds = Lexer::new("tags IN ('a', 'b')")
//!     .map(|token| token.kind)
//!     .collect::<Vec<_>>();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Ident,
//!         TokenKind::In,
//!         TokenKind::LParen,
//!         TokenKind::String,
//!         TokenKind::Comma,
//!         TokenKind::String,
//!         TokenKind::RParen,
//!         TokenKind::Eof,
//!     ]
//! );
//! ```

use crate::{Position, Token, TokenKind};

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    position: Position,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: Position::start(),
            finished: false,
        }
    }

    /// Scans the next token. Returns `Eof` repeatedly once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.position;

        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, "", start);
        };

        match ch {
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBrack, start),
            ']' => self.single(TokenKind::RBrack, start),
            ',' => self.single(TokenKind::Comma, start),
            '=' => self.operator('=', TokenKind::Eq, TokenKind::Error, start),
            '!' => self.operator('=', TokenKind::Ne, TokenKind::Error, start),
            '<' => self.operator('=', TokenKind::Le, TokenKind::Lt, start),
            '>' => self.operator('=', TokenKind::Ge, TokenKind::Gt, start),
            '\'' => self.string(start),
            '-' => self.number(start),
            ch if ch.is_ascii_digit() => self.number(start),
            ch if ch.is_alphabetic() || ch == '_' => self.word(start),
            _ => self.single(TokenKind::Error, start),
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position.offset += ch.len_utf8();
        if ch == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(ch)
    }

    fn bump_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
    }

    fn skip_whitespace(&mut self) {
        self.bump_while(char::is_whitespace);
    }

    fn lexeme(&self, start: Position) -> &'a str {
        &self.source[start.offset..self.position.offset]
    }

    fn emit(&self, kind: TokenKind, start: Position) -> Token {
        Token::new(kind, self.lexeme(start), start)
    }

    fn single(&mut self, kind: TokenKind, start: Position) -> Token {
        self.bump();
        self.emit(kind, start)
    }

    /// Scans a one-character operator that becomes `paired` when followed by `second`.
    fn operator(
        &mut self,
        second: char,
        paired: TokenKind,
        alone: TokenKind,
        start: Position,
    ) -> Token {
        self.bump();
        if self.peek() == Some(second) {
            self.bump();
            return self.emit(paired, start);
        }
        self.emit(alone, start)
    }

    fn number(&mut self, start: Position) -> Token {
        if self.peek() == Some('-') {
            self.bump();
        }
        if !self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            return self.emit(TokenKind::Error, start);
        }
        self.bump_while(|ch| ch.is_ascii_digit());

        if self.peek() == Some('.') {
            self.bump();
            if !self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                return self.emit(TokenKind::Error, start);
            }
            self.bump_while(|ch| ch.is_ascii_digit());
        }

        self.emit(TokenKind::Number, start)
    }

    fn word(&mut self, start: Position) -> Token {
        self.bump_while(|ch| ch.is_alphanumeric() || ch == '_');
        let kind = TokenKind::keyword(self.lexeme(start)).unwrap_or(TokenKind::Ident);
        self.emit(kind, start)
    }

    fn string(&mut self, start: Position) -> Token {
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                None => return self.emit(TokenKind::Error, start),
                Some('\'') => return Token::new(TokenKind::String, value, start),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        _ => return self.emit(TokenKind::Error, start),
                    };
                    value.push(escaped);
                }
                Some(ch) => value.push(ch),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
