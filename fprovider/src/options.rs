//! Portable model options shared by every provider.
//!
//! ```rust
//! use fprovider::ModelOptions;
//!
//! let options = ModelOptions::new("gpt-4o-mini")
//!     .with_temperature(0.2)
//!     .with_max_tokens(256)
//!     .with_stop("###");
//!
//! assert!(options.validate().is_ok());
//! assert_eq!(options.stop_sequences, vec!["###".to_string()]);
//! ```

use fcommon::MetadataMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool arguments.
    pub input_schema: String,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: input_schema.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelOptions {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    /// Seed values copied into every tool context.
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub tool_params: MetadataMap,
}

impl ModelOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tool_params.insert(key.into(), value.into());
        self
    }

    pub fn has_model(&self) -> bool {
        !self.model.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if !self.has_model() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if let Some(max_tokens) = self.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn validate_enforces_contract() {
        let err = ModelOptions::new("   ")
            .validate()
            .expect_err("empty model must fail");
        assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);

        let err = ModelOptions::new("gpt")
            .with_temperature(2.5)
            .validate()
            .expect_err("temperature outside range must fail");
        assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);

        let err = ModelOptions::new("gpt")
            .with_max_tokens(0)
            .validate()
            .expect_err("max_tokens=0 must fail");
        assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);

        let valid = ModelOptions::new("gpt")
            .with_temperature(0.4)
            .with_top_k(40)
            .with_tool_param("tenant", "acme");
        assert!(valid.validate().is_ok());
        assert_eq!(valid.tool_params.get("tenant"), Some(&Value::from("acme")));
    }

    #[test]
    fn clone_is_independent() {
        let original = ModelOptions::new("gpt").with_stop("a");
        let mut copy = original.clone();
        copy.stop_sequences.push("b".to_string());

        assert_eq!(original.stop_sequences.len(), 1);
        assert_eq!(copy.stop_sequences.len(), 2);
    }
}
