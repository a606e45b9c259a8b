//! Common `fprompt` imports for downstream crates.

pub use crate::{
    JsonParser, ListParser, MapParser, PromptError, PromptErrorKind, PromptTemplate,
    StructuredParser, SystemPromptTemplate, TextParser, UserPromptTemplate,
};
