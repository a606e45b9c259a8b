//! Tool trait contract and the two built-in tool shapes.
//!
//! ```rust
//! use ftooling::{ExternalTool, FunctionTool, Tool};
//!
//! let echo = FunctionTool::builder("echo")
//!     .description("Echoes input")
//!     .input_schema(r#"{"type":"object"}"#)
//!     .handler(|_ctx, args| async move { Ok(args) })
//!     .build()
//!     .expect("valid tool");
//!
//! let prompt = ExternalTool::builder("ui_prompt")
//!     .input_schema(r#"{"type":"object"}"#)
//!     .build()
//!     .expect("valid tool");
//!
//! assert_eq!(echo.definition().name, "echo");
//! assert!(echo.is_internal());
//! assert!(!prompt.is_internal());
//! ```

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use fcommon::BoxFuture;
use fprovider::ToolDefinition;

use crate::{ToolContext, ToolError};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolMetadata {
    /// Return the tool result straight to the caller instead of feeding it to the model.
    pub return_direct: bool,
}

pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::default()
    }

    /// External tools are handed back to the caller for out-of-band execution.
    fn is_internal(&self) -> bool {
        true
    }

    fn invoke<'a>(
        &'a self,
        context: Arc<ToolContext>,
        args_json: String,
    ) -> ToolFuture<'a, Result<String, ToolError>>;
}

pub fn validate_definition(definition: &ToolDefinition) -> Result<(), ToolError> {
    if definition.name.trim().is_empty() {
        return Err(ToolError::invalid_definition("tool name must not be empty"));
    }

    if definition.input_schema.trim().is_empty() {
        return Err(ToolError::invalid_definition(format!(
            "tool '{}' must declare an input schema",
            definition.name
        ))
        .with_tool_name(&definition.name));
    }

    Ok(())
}

type ToolHandler = dyn Fn(Arc<ToolContext>, String) -> ToolFuture<'static, Result<String, ToolError>>
    + Send
    + Sync;

pub struct FunctionTool {
    definition: ToolDefinition,
    metadata: ToolMetadata,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Result<Self, ToolError>
    where
        F: Fn(Arc<ToolContext>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        validate_definition(&definition)?;

        let handler: Arc<ToolHandler> =
            Arc::new(move |context, args_json| Box::pin(handler(context, args_json)));

        Ok(Self {
            definition,
            metadata: ToolMetadata::default(),
            handler,
        })
    }

    pub fn from_sync<F>(definition: ToolDefinition, handler: F) -> Result<Self, ToolError>
    where
        F: Fn(&ToolContext, &str) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self::new(definition, move |context, args_json| {
            let output = handler(&context, &args_json);
            async move { output }
        })
    }

    pub fn builder(name: impl Into<String>) -> FunctionToolBuilder {
        FunctionToolBuilder {
            definition: ToolDefinition::new(name, "", ""),
            metadata: ToolMetadata::default(),
            handler: None,
        }
    }

    pub fn with_return_direct(mut self, return_direct: bool) -> Self {
        self.metadata.return_direct = return_direct;
        self
    }
}

impl Debug for FunctionTool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("definition", &self.definition)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn metadata(&self) -> ToolMetadata {
        self.metadata
    }

    fn invoke<'a>(
        &'a self,
        context: Arc<ToolContext>,
        args_json: String,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        (self.handler)(context, args_json)
    }
}

pub struct FunctionToolBuilder {
    definition: ToolDefinition,
    metadata: ToolMetadata,
    handler: Option<Arc<ToolHandler>>,
}

impl FunctionToolBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = description.into();
        self
    }

    pub fn input_schema(mut self, input_schema: impl Into<String>) -> Self {
        self.definition.input_schema = input_schema.into();
        self
    }

    pub fn return_direct(mut self, return_direct: bool) -> Self {
        self.metadata.return_direct = return_direct;
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Arc<ToolContext>, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |context, args_json| Box::pin(handler(context, args_json)));
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<FunctionTool, ToolError> {
        validate_definition(&self.definition)?;
        let handler = self.handler.ok_or_else(|| {
            ToolError::invalid_definition(format!(
                "tool '{}' has no handler",
                self.definition.name
            ))
            .with_tool_name(&self.definition.name)
        })?;

        Ok(FunctionTool {
            definition: self.definition,
            metadata: self.metadata,
            handler,
        })
    }
}

/// Tool without an in-process handler.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    definition: ToolDefinition,
}

impl ExternalTool {
    pub fn new(definition: ToolDefinition) -> Result<Self, ToolError> {
        validate_definition(&definition)?;
        Ok(Self { definition })
    }

    pub fn builder(name: impl Into<String>) -> ExternalToolBuilder {
        ExternalToolBuilder {
            definition: ToolDefinition::new(name, "", ""),
        }
    }
}

impl Tool for ExternalTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn is_internal(&self) -> bool {
        false
    }

    fn invoke<'a>(
        &'a self,
        _context: Arc<ToolContext>,
        _args_json: String,
    ) -> ToolFuture<'a, Result<String, ToolError>> {
        let error = ToolError::invalid_tool_call(format!(
            "tool '{}' is external and must be executed by the caller",
            self.definition.name
        ))
        .with_tool_name(&self.definition.name);

        Box::pin(async move { Err(error) })
    }
}

#[derive(Debug, Clone)]
pub struct ExternalToolBuilder {
    definition: ToolDefinition,
}

impl ExternalToolBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = description.into();
        self
    }

    pub fn input_schema(mut self, input_schema: impl Into<String>) -> Self {
        self.definition.input_schema = input_schema.into();
        self
    }

    pub fn build(self) -> Result<ExternalTool, ToolError> {
        ExternalTool::new(self.definition)
    }
}
