//! Filter expression tree and its canonical text rendering.
//!
//! Rendering adds parentheses only where precedence requires them, so any tree produced by
//! the parser renders to text that parses back to an equal tree.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Number(Number),
    String(String),
    Bool(bool),
}

/// A numeric literal exactly as written.
///
/// The lexeme is kept next to the parsed value so integers beyond `f64` precision and
/// spellings such as `007` or `1.50` survive rendering unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Number {
    lexeme: String,
    value: f64,
}

impl Number {
    /// Parses a lexeme of the form `-?digits(.digits)?`. Returns `None` for anything else.
    pub fn parse(lexeme: &str) -> Option<Self> {
        let unsigned = lexeme.strip_prefix('-').unwrap_or(lexeme);
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (unsigned, None),
        };
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole) || fraction.is_some_and(|fraction| !digits(fraction)) {
            return None;
        }

        let value = lexeme.parse::<f64>().ok()?;
        Some(Self {
            lexeme: lexeme.to_string(),
            value,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.lexeme
    }

    /// Nearest `f64`; lossy for integers wider than 53 bits.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.lexeme.parse().ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.lexeme.parse().ok()
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self {
            lexeme: value.to_string(),
            value: value as f64,
        }
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self {
            lexeme: value.to_string(),
            value,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.lexeme)
    }
}

/// Literal categories used to check list homogeneity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Number,
    String,
    Bool,
}

impl Literal {
    pub fn kind(&self) -> LiteralKind {
        match self {
            Self::Number(_) => LiteralKind::Number,
            Self::String(_) => LiteralKind::String,
            Self::Bool(_) => LiteralKind::Bool,
        }
    }
}

impl From<Number> for Literal {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Number(Number::from(i64::from(value)))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::String(value) => {
                f.write_str("'")?;
                for ch in value.chars() {
                    match ch {
                        '\\' => f.write_str("\\\\")?,
                        '\'' => f.write_str("\\'")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        ch => write!(f, "{ch}")?,
                    }
                }
                f.write_str("'")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Like,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "IN",
            Self::Like => "LIKE",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 4,
            Self::In | Self::Like => 5,
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const NOT_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Ident {
        name: String,
    },
    Literal {
        value: Literal,
    },
    List {
        items: Vec<Literal>,
    },
    Index {
        target: Box<Expr>,
        index: Literal,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident { name: name.into() }
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    pub fn list(items: impl IntoIterator<Item = Literal>) -> Self {
        Self::List {
            items: items.into_iter().collect(),
        }
    }

    pub fn index(target: Expr, index: impl Into<Literal>) -> Self {
        Self::Index {
            target: Box::new(target),
            index: index.into(),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { .. } => NOT_PRECEDENCE,
            Self::Ident { .. } | Self::Literal { .. } | Self::List { .. } | Self::Index { .. } => {
                ATOM_PRECEDENCE
            }
        }
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>, parenthesize: bool) -> std::fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident { name } => f.write_str(name),
            Self::Literal { value } => write!(f, "{value}"),
            Self::List { items } => {
                f.write_str("(")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Index { target, index } => {
                target.fmt_operand(f, target.precedence() < ATOM_PRECEDENCE)?;
                write!(f, "[{index}]")
            }
            Self::Unary { op: UnaryOp::Not, operand } => {
                f.write_str("NOT ")?;
                operand.fmt_operand(f, operand.precedence() < NOT_PRECEDENCE)
            }
            Self::Binary { op, left, right } => {
                let precedence = op.precedence();
                left.fmt_operand(f, left.precedence() < precedence)?;
                write!(f, " {op} ")?;
                right.fmt_operand(f, right.precedence() <= precedence)
            }
        }
    }
}
