//! Structured output parsers.
//!
//! A parser contributes an instruction block that is appended to the last user message,
//! then coerces the model's free text back into a typed value.
//!
//! ```rust
//! use fprompt::{ListParser, StructuredParser};
//!
//! let parser = ListParser;
//! assert!(parser.instructions().contains("comma-separated"));
//! assert_eq!(parser.parse("red, green , blue").unwrap(), vec!["red", "green", "blue"]);
//! ```

use std::collections::HashMap;
use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::PromptError;

const LIST_INSTRUCTIONS: &str = "Respond with only a list of comma-separated values, \
without any leading or trailing text.\nExample format: foo, bar, baz";

const JSON_INSTRUCTIONS: &str = "Your response should be in JSON format.\n\
Do not include any explanations, only provide a RFC8259 compliant JSON response following \
this format without deviation.\nDo not include markdown code blocks in your response.\n\
Remove the ```json markdown from the output.";

pub trait StructuredParser<T>: Send + Sync {
    fn instructions(&self) -> String;

    fn parse(&self, text: &str) -> Result<T, PromptError>;
}

/// Identity parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser;

impl StructuredParser<String> for TextParser {
    fn instructions(&self) -> String {
        String::new()
    }

    fn parse(&self, text: &str) -> Result<String, PromptError> {
        Ok(text.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListParser;

impl StructuredParser<Vec<String>> for ListParser {
    fn instructions(&self) -> String {
        LIST_INSTRUCTIONS.to_string()
    }

    fn parse(&self, text: &str) -> Result<Vec<String>, PromptError> {
        Ok(text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MapParser;

impl StructuredParser<HashMap<String, Value>> for MapParser {
    fn instructions(&self) -> String {
        JSON_INSTRUCTIONS.to_string()
    }

    fn parse(&self, text: &str) -> Result<HashMap<String, Value>, PromptError> {
        let body = strip_code_fence(text);
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
            Ok(other) => Err(PromptError::json_parse_failed(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))),
            Err(err) => Err(PromptError::json_parse_failed(err.to_string())),
        }
    }
}

/// Parses into `T`, embedding `T`'s JSON schema into the instructions.
///
/// The schema is generated once when the parser is built.
#[derive(Debug, Clone)]
pub struct JsonParser<T> {
    schema: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonParser<T>
where
    T: DeserializeOwned + JsonSchema,
{
    pub fn new() -> Result<Self, PromptError> {
        let schema = schemars::schema_for!(T);
        let schema = serde_json::to_string_pretty(&schema)
            .map_err(|err| PromptError::schema(err.to_string()))?;

        Ok(Self {
            schema,
            _marker: PhantomData,
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

impl<T> StructuredParser<T> for JsonParser<T>
where
    T: DeserializeOwned + JsonSchema,
{
    fn instructions(&self) -> String {
        format!(
            "{JSON_INSTRUCTIONS}\nHere is the JSON Schema instance your output must adhere to:\n```{}```",
            self.schema
        )
    }

    fn parse(&self, text: &str) -> Result<T, PromptError> {
        serde_json::from_str(strip_code_fence(text))
            .map_err(|err| PromptError::json_parse_failed(err.to_string()))
    }
}

/// Removes a surrounding markdown code fence, including an optional language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };

    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim().contains(['{', '[']) => inner[newline + 1..].trim(),
        _ => inner.trim(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
