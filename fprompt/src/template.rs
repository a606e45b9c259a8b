//! Named-placeholder templates rendered into typed messages.
//!
//! Placeholders are written `{name}`; `{{` and `}}` produce literal braces.
//!
//! ```rust
//! use fcommon::MetadataMap;
//! use fprompt::{PromptTemplate, SystemPromptTemplate};
//!
//! let template = PromptTemplate::new("Say hello to {name}. {{literal}}");
//! let mut vars = MetadataMap::new();
//! vars.insert("name".to_string(), "World".into());
//!
//! assert_eq!(template.render(&vars).unwrap(), "Say hello to World. {literal}");
//!
//! let system = SystemPromptTemplate::new("You are a {role}.").with_variable("role", "pirate");
//! assert_eq!(system.render(&MetadataMap::new()).unwrap().text(), "You are a pirate.");
//! ```

use std::sync::OnceLock;

use fcommon::MetadataMap;
use fprovider::{Media, Message, SystemMessage, UserMessage};
use regex::Regex;
use serde_json::Value;

use crate::PromptError;

const PLACEHOLDER_PATTERN: &str = r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}|\{|\}";

fn placeholder_pattern() -> Result<&'static Regex, PromptError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

    PATTERN
        .get_or_init(|| Regex::new(PLACEHOLDER_PATTERN))
        .as_ref()
        .map_err(|err| PromptError::invalid_template(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptTemplate {
    source: String,
    variables: MetadataMap,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            variables: MetadataMap::new(),
        }
    }

    /// Binds a default value; values passed to [`PromptTemplate::render`] take precedence.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn variables(&self) -> &MetadataMap {
        &self.variables
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Result<Vec<String>, PromptError> {
        let pattern = placeholder_pattern()?;
        let mut names: Vec<String> = Vec::new();

        for captures in pattern.captures_iter(&self.source) {
            if let Some(name) = captures.get(1)
                && !names.iter().any(|existing| existing == name.as_str())
            {
                names.push(name.as_str().to_string());
            }
        }

        Ok(names)
    }

    pub fn render(&self, vars: &MetadataMap) -> Result<String, PromptError> {
        let pattern = placeholder_pattern()?;
        let mut rendered = String::with_capacity(self.source.len());
        let mut last = 0;

        for captures in pattern.captures_iter(&self.source) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            rendered.push_str(&self.source[last..whole.start()]);
            last = whole.end();

            match (whole.as_str(), captures.get(1)) {
                ("{{", _) => rendered.push('{'),
                ("}}", _) => rendered.push('}'),
                (_, Some(name)) => {
                    let value = vars
                        .get(name.as_str())
                        .or_else(|| self.variables.get(name.as_str()))
                        .ok_or_else(|| PromptError::missing_variable(name.as_str()))?;
                    push_value(&mut rendered, value);
                }
                (brace, None) => {
                    return Err(PromptError::invalid_template(format!(
                        "unbalanced '{brace}' at byte {}",
                        whole.start()
                    )));
                }
            }
        }

        rendered.push_str(&self.source[last..]);
        Ok(rendered)
    }
}

fn push_value(target: &mut String, value: &Value) {
    match value {
        Value::String(text) => target.push_str(text),
        Value::Null => {}
        other => target.push_str(&other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemPromptTemplate {
    template: PromptTemplate,
}

impl SystemPromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            template: PromptTemplate::new(source),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template = self.template.with_variable(name, value);
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn render(&self, vars: &MetadataMap) -> Result<Message, PromptError> {
        let text = self.template.render(vars)?;
        Ok(Message::System(SystemMessage::new(text)))
    }
}

impl From<PromptTemplate> for SystemPromptTemplate {
    fn from(template: PromptTemplate) -> Self {
        Self { template }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserPromptTemplate {
    template: PromptTemplate,
    media: Vec<Media>,
}

impl UserPromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            template: PromptTemplate::new(source),
            media: Vec::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template = self.template.with_variable(name, value);
        self
    }

    pub fn with_media(mut self, media: Vec<Media>) -> Self {
        self.media = media;
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn media(&self) -> &[Media] {
        &self.media
    }

    pub fn render(&self, vars: &MetadataMap) -> Result<Message, PromptError> {
        let text = self.template.render(vars)?;
        Ok(Message::User(
            UserMessage::new(text).with_media(self.media.clone()),
        ))
    }
}

impl From<PromptTemplate> for UserPromptTemplate {
    fn from(template: PromptTemplate) -> Self {
        Self {
            template,
            media: Vec::new(),
        }
    }
}
