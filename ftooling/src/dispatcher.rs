//! Tool-call dispatcher deciding whether a turn continues with the model.
//!
//! Given a response that carries tool calls, the dispatcher executes internal tools in call
//! order and then picks one of three outcomes:
//!
//! - any external call: terminate, handing exactly the external calls back to the caller;
//! - every internal tool asked for direct return: terminate with `ReturnDirect`;
//! - otherwise: continue with a request extended by the assistant turn and the tool returns.

use std::sync::Arc;
use std::time::Instant;

use fcommon::CallContext;
use fprovider::{
    AssistantMessage, ChatRequest, ChatResponse, FinishReason, Generation, Message, ToolCall,
    ToolMessage, ToolReturn,
};
use tracing::debug;

use crate::{
    NoopToolRuntimeHooks, Tool, ToolContext, ToolError, ToolErrorKind, ToolRegistry,
    ToolRuntimeHooks,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Re-enter the model with this request.
    Continue(ChatRequest),
    /// Return this response to the caller.
    Terminate(ChatResponse),
}

#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns `false` when no result carries tool calls and fails when a referenced tool
    /// is missing from the registry.
    pub fn can_invoke(&self, response: &ChatResponse) -> Result<bool, ToolError> {
        let Some(generation) = tool_generation(response) else {
            return Ok(false);
        };

        for call in &generation.assistant.tool_calls {
            if !self.registry.contains(&call.name) {
                return Err(ToolError::not_registered(&call.name).with_tool_call_id(&call.id));
            }
        }

        Ok(true)
    }

    pub async fn dispatch(
        &self,
        ctx: &CallContext,
        request: &ChatRequest,
        response: &ChatResponse,
    ) -> Result<DispatchOutcome, ToolError> {
        let generation = tool_generation(response).ok_or_else(|| {
            ToolError::invalid_tool_call("response does not contain any tool calls")
        })?;

        let mut returns: Vec<ToolReturn> = Vec::new();
        let mut external_calls: Vec<ToolCall> = Vec::new();
        let mut all_return_direct = true;

        for call in &generation.assistant.tool_calls {
            ctx.check()?;

            let tool = self
                .registry
                .get(&call.name)
                .ok_or_else(|| ToolError::not_registered(&call.name).with_tool_call_id(&call.id))?;

            if !tool.is_internal() {
                debug!(
                    event = "external_tool_call",
                    tool_name = %call.name,
                    tool_call_id = %call.id
                );
                self.hooks.on_external_call(call);
                external_calls.push(call.clone());
                continue;
            }

            let context = Arc::new(
                ToolContext::new(ctx.clone()).with_fields(request.options().tool_params.clone()),
            );
            let tool_return = self.execute(tool.as_ref(), call, context).await?;
            all_return_direct &= tool.metadata().return_direct;
            returns.push(tool_return);
        }

        if !external_calls.is_empty() {
            debug!(
                event = "dispatch_terminate_external",
                external_calls = external_calls.len(),
                internal_returns = returns.len()
            );
            return terminate_with_external(response, generation, external_calls, returns)
                .map(DispatchOutcome::Terminate);
        }

        let tool_message = ToolMessage::new(returns)
            .map_err(|err| ToolError::invalid_tool_call(err.message))?;

        if all_return_direct {
            debug!(event = "dispatch_return_direct", returns = tool_message.returns().len());
            let assistant = AssistantMessage {
                text: direct_text(tool_message.returns()),
                ..generation.assistant.clone()
            };
            let result = Generation::new(assistant)
                .with_tool_message(tool_message)
                .with_finish_reason(FinishReason::ReturnDirect);

            return Ok(DispatchOutcome::Terminate(
                ChatResponse::new(vec![result])
                    .with_metadata(response.metadata.clone())
                    .with_params(response.params().clone()),
            ));
        }

        debug!(event = "dispatch_continue", returns = tool_message.returns().len());
        let mut messages = request.messages().to_vec();
        messages.push(Message::Assistant(generation.assistant.clone()));
        messages.push(Message::Tool(tool_message));

        Ok(DispatchOutcome::Continue(request.with_messages(messages)))
    }

    async fn execute(
        &self,
        tool: &dyn Tool,
        call: &ToolCall,
        context: Arc<ToolContext>,
    ) -> Result<ToolReturn, ToolError> {
        self.hooks.on_execution_start(call, &context);
        let started = Instant::now();

        let outcome = match context
            .context()
            .run(tool.invoke(Arc::clone(&context), call.arguments.clone()))
            .await
        {
            Ok(Ok(output)) => Ok(ToolReturn::new(&call.id, &call.name, output)),
            Ok(Err(error)) if error.kind == ToolErrorKind::Cancelled => {
                Err(error.with_tool_name(&call.name).with_tool_call_id(&call.id))
            }
            Ok(Err(error)) => {
                Err(ToolError::execution_failed(&call.name, error).with_tool_call_id(&call.id))
            }
            Err(context_error) => Err(ToolError::from(context_error)
                .with_tool_name(&call.name)
                .with_tool_call_id(&call.id)),
        };

        let elapsed = started.elapsed();
        match &outcome {
            Ok(tool_return) => {
                self.hooks
                    .on_execution_success(call, &context, tool_return, elapsed)
            }
            Err(error) => self.hooks.on_execution_failure(call, &context, error, elapsed),
        }

        outcome
    }
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn tool_generation(response: &ChatResponse) -> Option<&Generation> {
    response
        .results()
        .iter()
        .find(|result| result.assistant.has_tool_calls())
}

/// Caller-facing text of a direct-return turn: each tool result, in call order.
fn direct_text(returns: &[ToolReturn]) -> String {
    returns
        .iter()
        .map(|tool_return| tool_return.result.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn terminate_with_external(
    response: &ChatResponse,
    generation: &Generation,
    external_calls: Vec<ToolCall>,
    returns: Vec<ToolReturn>,
) -> Result<ChatResponse, ToolError> {
    let assistant = AssistantMessage {
        text: generation.assistant.text.clone(),
        tool_calls: external_calls,
        metadata: generation.assistant.metadata.clone(),
    };

    let mut result = Generation::new(assistant).with_finish_reason(FinishReason::ToolCalls);
    if !returns.is_empty() {
        let tool_message =
            ToolMessage::new(returns).map_err(|err| ToolError::invalid_tool_call(err.message))?;
        result = result.with_tool_message(tool_message);
    }

    Ok(ChatResponse::new(vec![result])
        .with_metadata(response.metadata.clone())
        .with_params(response.params().clone()))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use fprovider::{ModelOptions, tool_call_response, text_response};

    use super::*;
    use crate::{ExternalTool, FunctionTool};

    fn calc(return_direct: bool) -> FunctionTool {
        FunctionTool::builder("calc")
            .input_schema("{\"type\":\"object\"}")
            .return_direct(return_direct)
            .handler(|_ctx, args| async move { Ok(format!("calc({args})")) })
            .build()
            .expect("valid tool")
    }

    fn ui_prompt() -> ExternalTool {
        ExternalTool::builder("ui_prompt")
            .input_schema("{\"type\":\"object\"}")
            .build()
            .expect("valid tool")
    }

    fn request() -> ChatRequest {
        ChatRequest::new(vec![Message::user("what is 2+2")], ModelOptions::new("m"))
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ToolRuntimeHooks for RecordingHooks {
        fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolContext) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("start:{}", tool_call.id));
        }

        fn on_execution_success(
            &self,
            tool_call: &ToolCall,
            _context: &ToolContext,
            _result: &ToolReturn,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("success:{}", tool_call.id));
        }

        fn on_execution_failure(
            &self,
            tool_call: &ToolCall,
            _context: &ToolContext,
            _error: &ToolError,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("failure:{}", tool_call.id));
        }
    }

    #[test]
    fn can_invoke_reports_missing_tools() {
        let registry = Arc::new(ToolRegistry::new());
        let dispatcher = ToolDispatcher::new(Arc::clone(&registry));

        assert!(!dispatcher.can_invoke(&text_response("hi")).expect("no calls"));

        let response = tool_call_response(vec![ToolCall::new("call_1", "calc", "{}")]);
        let error = dispatcher.can_invoke(&response).expect_err("calc missing");
        assert_eq!(error.kind, ToolErrorKind::NotRegistered);

        registry.register(calc(false));
        assert!(dispatcher.can_invoke(&response).expect("calc registered"));
    }

    #[tokio::test]
    async fn internal_tool_continues_with_extended_request() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(calc(false));
        let hooks = Arc::new(RecordingHooks::default());
        let dispatcher = ToolDispatcher::new(registry).with_hooks(hooks.clone());

        let response = tool_call_response(vec![
            ToolCall::new("call_1", "calc", "{\"expr\":\"2+2\"}"),
            ToolCall::new("call_2", "calc", "{\"expr\":\"3+3\"}"),
        ]);
        let outcome = dispatcher
            .dispatch(&CallContext::new(), &request(), &response)
            .await
            .expect("dispatch succeeds");

        let DispatchOutcome::Continue(next) = outcome else {
            panic!("expected continuation");
        };
        let messages = next.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[1].as_assistant().is_some_and(|m| m.tool_calls.len() == 2));

        let returns = messages[2].as_tool().expect("tool message").returns();
        assert_eq!(returns[0].tool_call_id, "call_1");
        assert_eq!(returns[1].result, "calc({\"expr\":\"3+3\"})");

        assert_eq!(
            *hooks.events.lock().expect("events lock"),
            vec!["start:call_1", "success:call_1", "start:call_2", "success:call_2"]
        );
    }

    #[tokio::test]
    async fn return_direct_tools_terminate() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(calc(true));
        let dispatcher = ToolDispatcher::new(registry);

        let response = tool_call_response(vec![
            ToolCall::new("call_1", "calc", "{}"),
            ToolCall::new("call_2", "calc", "[]"),
        ]);
        let outcome = dispatcher
            .dispatch(&CallContext::new(), &request(), &response)
            .await
            .expect("dispatch succeeds");

        let DispatchOutcome::Terminate(done) = outcome else {
            panic!("expected termination");
        };
        assert_eq!(done.finish_reason(), Some(&FinishReason::ReturnDirect));
        assert_eq!(done.text(), "calc({})\n\ncalc([])");
        assert_eq!(done.tool_calls().len(), 2);
        let tool_message = done.results()[0].tool_message.as_ref().expect("returns");
        let results = tool_message
            .returns()
            .iter()
            .map(|tool_return| tool_return.result.as_str())
            .collect::<Vec<_>>();
        assert_eq!(results, vec!["calc({})", "calc([])"]);
    }

    #[tokio::test]
    async fn external_calls_terminate_without_internal_calls_in_assistant() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(calc(false));
        registry.register(ui_prompt());
        let dispatcher = ToolDispatcher::new(registry);

        let response = tool_call_response(vec![
            ToolCall::new("call_1", "calc", "{}"),
            ToolCall::new("call_2", "ui_prompt", "{}"),
        ]);
        let outcome = dispatcher
            .dispatch(&CallContext::new(), &request(), &response)
            .await
            .expect("dispatch succeeds");

        let DispatchOutcome::Terminate(done) = outcome else {
            panic!("expected termination");
        };
        let result = &done.results()[0];
        assert_eq!(result.assistant.tool_calls.len(), 1);
        assert_eq!(result.assistant.tool_calls[0].name, "ui_prompt");
        let returns = result.tool_message.as_ref().expect("internal returns").returns();
        assert_eq!(returns[0].tool_call_id, "call_1");
    }

    #[tokio::test]
    async fn failing_tool_aborts_dispatch() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&attempts);
        let registry = Arc::new(ToolRegistry::new());
        registry.register(
            FunctionTool::builder("broken")
                .input_schema("{}")
                .handler(move |_ctx, _args| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    async move { Err(ToolError::execution("exploded")) }
                })
                .build()
                .expect("valid tool"),
        );
        let dispatcher = ToolDispatcher::new(registry);

        let response = tool_call_response(vec![
            ToolCall::new("call_1", "broken", "{}"),
            ToolCall::new("call_2", "broken", "{}"),
        ]);
        let error = dispatcher
            .dispatch(&CallContext::new(), &request(), &response)
            .await
            .expect_err("tool failure aborts");

        assert_eq!(error.kind, ToolErrorKind::Execution);
        assert_eq!(error.tool_name.as_deref(), Some("broken"));
        assert_eq!(error.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_context_stops_before_execution() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(calc(false));
        let dispatcher = ToolDispatcher::new(registry);
        let ctx = CallContext::new();
        ctx.cancel();

        let response = tool_call_response(vec![ToolCall::new("call_1", "calc", "{}")]);
        let error = dispatcher
            .dispatch(&ctx, &request(), &response)
            .await
            .expect_err("cancelled");
        assert_eq!(error.kind, ToolErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn tool_params_seed_context_fields() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(
            FunctionTool::from_sync(
                fprovider::ToolDefinition::new("tenant", "", "{}"),
                |context, _args| {
                    Ok(context
                        .get("tenant")
                        .and_then(|value| value.as_str().map(str::to_string))
                        .unwrap_or_default())
                },
            )
            .expect("valid tool"),
        );
        let dispatcher = ToolDispatcher::new(registry);
        let request = ChatRequest::new(
            vec![Message::user("who am i")],
            ModelOptions::new("m").with_tool_param("tenant", "acme"),
        );

        let response = tool_call_response(vec![ToolCall::new("call_1", "tenant", "{}")]);
        let DispatchOutcome::Continue(next) = dispatcher
            .dispatch(&CallContext::new(), &request, &response)
            .await
            .expect("dispatch succeeds")
        else {
            panic!("expected continuation");
        };

        let returns = next.messages()[2].as_tool().expect("tool message").returns();
        assert_eq!(returns[0].result, "acme");
    }
}
