//! Filter expressions for metadata-aware retrieval.
//!
//! A small boolean query language over named fields:
//!
//! ```text
//! author == 'jane' AND (year >= 2020 OR tags IN ('rust', 'llm')) AND NOT meta['draft'] == true
//! ```
//!
//! [`parse`] turns text into an [`Expr`] tree. Backends translate the tree into their native
//! filter dialect by implementing [`Visitor`], and [`Expr`]'s `Display` renders the canonical
//! text form.
//!
//! ```rust
//! use ffilter::{Parser, parse};
//!
//! let expr = parse("year >= 2020 AND tags IN ('rust', 'llm')").expect("valid filter");
//! let rendered = expr.to_string();
//! assert_eq!(rendered, "year >= 2020 AND tags IN ('rust', 'llm')");
//! assert_eq!(Parser::new(&rendered).parse().expect("reparses"), expr);
//! ```

mod ast;
mod error;
mod lexer;
mod parser;
mod token;
mod visitor;

pub mod prelude {
    pub use crate::{
        BinaryOp, Expr, FilterError, FilterErrorKind, Literal, LiteralKind, Number, Parser, UnaryOp,
        Visitor, parse, walk,
    };
}

pub use ast::{BinaryOp, Expr, Literal, LiteralKind, Number, UnaryOp};
pub use error::{FilterError, FilterErrorKind};
pub use lexer::Lexer;
pub use parser::{Parser, parse};
pub use token::{Position, Token, TokenKind};
pub use visitor::{Visitor, walk};
