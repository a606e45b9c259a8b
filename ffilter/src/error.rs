//! Parse errors for filter expressions.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::{Position, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterErrorKind {
    UnexpectedToken,
    UnexpectedEof,
    TypeMismatch,
    EmptyParentheses,
    TrailingComma,
    InvalidIndexType,
    InvalidToken,
}

/// A parse failure pinned to the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    pub kind: FilterErrorKind,
    pub token: Token,
    pub message: String,
}

impl FilterError {
    /// Builds an error whose message embeds `detail`, the token and its position.
    pub fn new(kind: FilterErrorKind, token: Token, detail: impl Display) -> Self {
        let message = format!("{detail}: found {token} at {}", token.position);
        Self {
            kind,
            token,
            message,
        }
    }

    pub fn position(&self) -> Position {
        self.token.position
    }
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for FilterError {}
