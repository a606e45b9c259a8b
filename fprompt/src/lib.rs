//! Prompt templates and structured output parsers.
//!
//! ```rust
//! use fcommon::MetadataMap;
//! use fprompt::{ListParser, StructuredParser, UserPromptTemplate};
//!
//! let mut vars = MetadataMap::new();
//! vars.insert("topic".to_string(), "colors".into());
//!
//! let message = UserPromptTemplate::new("List three {topic}.")
//!     .render(&vars)
//!     .expect("topic is bound");
//! assert_eq!(message.text(), "List three colors.");
//!
//! let colors = ListParser.parse("red, green, blue").expect("list output");
//! assert_eq!(colors.len(), 3);
//! ```

mod error;
mod parser;
mod template;

pub mod prelude;

pub use error::{PromptError, PromptErrorKind};
pub use parser::{JsonParser, ListParser, MapParser, StructuredParser, TextParser, strip_code_fence};
pub use template::{PromptTemplate, SystemPromptTemplate, UserPromptTemplate};
