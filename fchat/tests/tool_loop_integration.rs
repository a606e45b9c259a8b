use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fchat::prelude::*;
use fprovider::{FinishReason, ScriptedProvider, ToolCall, ToolReturn, text_response};
use fprompt::{SystemPromptTemplate, UserPromptTemplate};
use futures_util::StreamExt;

fn calc_tool(calls: Arc<AtomicUsize>, return_direct: bool) -> FunctionTool {
    FunctionTool::builder("calc")
        .description("Evaluates arithmetic")
        .input_schema(r#"{"type":"object","properties":{"expr":{"type":"string"}}}"#)
        .return_direct(return_direct)
        .handler(move |_ctx, _args| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok("4".to_string()) }
        })
        .build()
        .expect("calc tool is valid")
}

fn ui_prompt_tool() -> ExternalTool {
    ExternalTool::builder("ui_prompt")
        .description("Asks the human")
        .input_schema(r#"{"type":"object"}"#)
        .build()
        .expect("ui tool is valid")
}

fn client_with(provider: Arc<ScriptedProvider>, registry: Arc<ToolRegistry>) -> ChatClient {
    ChatClient::builder(provider)
        .default_options(ModelOptions::new("M"))
        .tool_registry(registry)
        .build()
        .expect("client builds")
}

#[tokio::test]
async fn single_text_turn_passes_messages_through() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("Hello back");
    let client = client_with(provider.clone(), Arc::new(ToolRegistry::new()));

    let response = client
        .prompt()
        .message(Message::user("Hi"))
        .call(CallContext::new())
        .response()
        .await
        .expect("turn succeeds");

    assert_eq!(response.text(), "Hello back");
    let sent = provider.last_request().expect("request recorded");
    assert_eq!(sent.messages(), &[Message::user("Hi")][..]);
    assert_eq!(sent.options().model, "M");
}

#[tokio::test]
async fn templates_seed_an_empty_prompt() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("Hello, World!");
    let client = client_with(provider.clone(), Arc::new(ToolRegistry::new()));

    client
        .prompt()
        .system_template(SystemPromptTemplate::new("You are a {role}."))
        .user_template(UserPromptTemplate::new("Say hello to {name}."))
        .var("role", "assistant")
        .var("name", "World")
        .call(CallContext::new())
        .text()
        .await
        .expect("turn succeeds");

    let sent = provider.last_request().expect("request recorded");
    assert_eq!(
        sent.messages(),
        &[
            Message::system("You are a assistant."),
            Message::user("Say hello to World.")
        ][..]
    );
}

#[tokio::test]
async fn adjacent_messages_are_merged_and_system_hoisted() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("ok");
    let client = client_with(provider.clone(), Arc::new(ToolRegistry::new()));

    let tr1 = ToolReturn::new("1", "calc", "4");
    let tr2 = ToolReturn::new("2", "calc", "9");
    client
        .prompt()
        .messages([
            Message::user("a"),
            Message::user("b"),
            Message::system("s"),
            Message::user("c"),
            Message::tool(vec![tr1.clone()]).expect("tool message"),
            Message::tool(vec![tr2.clone()]).expect("tool message"),
        ])
        .call(CallContext::new())
        .response()
        .await
        .expect("turn succeeds");

    let sent = provider.last_request().expect("request recorded");
    let kinds = sent
        .messages()
        .iter()
        .map(Message::kind)
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            MessageKind::System,
            MessageKind::User,
            MessageKind::User,
            MessageKind::Tool
        ]
    );
    assert_eq!(sent.messages()[1].text(), "a\n\nb");
    assert_eq!(sent.messages()[2].text(), "c");
    assert_eq!(
        sent.messages()[3].as_tool().expect("tool").returns(),
        &[tr1, tr2][..]
    );
}

#[tokio::test]
async fn internal_tool_result_is_fed_back_to_the_model() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![ToolCall::new("call-1", "calc", r#"{"expr":"2+2"}"#)]);
    provider.push_text("2+2 is 4");

    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(calc_tool(Arc::clone(&calls), false));
    let client = client_with(provider.clone(), registry);

    let text = client
        .prompt()
        .user("What is 2+2?")
        .call(CallContext::new())
        .text()
        .await
        .expect("turn succeeds");

    assert_eq!(text, "2+2 is 4");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.request_count(), 2);

    let first = &provider.requests()[0];
    assert_eq!(first.options().tools.len(), 1);
    assert_eq!(first.options().tools[0].name, "calc");

    let second = provider.last_request().expect("continuation recorded");
    let messages = second.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].kind(), MessageKind::Assistant);
    assert_eq!(
        messages[1].as_assistant().expect("assistant").tool_calls[0].id,
        "call-1"
    );
    let returns = messages[2].as_tool().expect("tool").returns();
    assert_eq!(returns, &[ToolReturn::new("call-1", "calc", "4")][..]);
    assert_eq!(fchat::tool_round(second.params()), 1);
}

#[tokio::test]
async fn external_tool_call_is_handed_back_without_execution() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![
        ToolCall::new("call-1", "calc", "{}"),
        ToolCall::new("call-2", "ui_prompt", r#"{"question":"continue?"}"#),
    ]);

    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(calc_tool(Arc::clone(&calls), false));
    registry.register(ui_prompt_tool());
    let client = client_with(provider.clone(), registry);

    let response = client
        .prompt()
        .user("Ask me first")
        .call(CallContext::new())
        .response()
        .await
        .expect("turn terminates");

    let tool_calls = response.tool_calls();
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0].name, "ui_prompt");
    assert_eq!(response.finish_reason(), Some(&FinishReason::ToolCalls));
    assert_eq!(provider.request_count(), 1);

    let result = response.result().expect("one result");
    let internal = result.tool_message.as_ref().expect("internal returns kept");
    assert_eq!(internal.returns()[0].tool_call_id, "call-1");
}

#[tokio::test]
async fn return_direct_tools_skip_the_second_model_call() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![ToolCall::new("call-1", "calc", "{}")]);

    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(calc_tool(Arc::clone(&calls), true));
    let client = client_with(provider.clone(), registry);

    let response = client
        .prompt()
        .user("2+2")
        .call(CallContext::new())
        .response()
        .await
        .expect("turn terminates");

    assert_eq!(response.finish_reason(), Some(&FinishReason::ReturnDirect));
    assert_eq!(provider.request_count(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.text(), "4");

    let result = response.result().expect("one result");
    let returns = result.tool_message.as_ref().expect("tool returns").returns();
    assert_eq!(returns, &[ToolReturn::new("call-1", "calc", "4")][..]);
}

#[tokio::test]
async fn return_direct_result_feeds_text_and_parsers() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![ToolCall::new("call-1", "palette", "{}")]);
    provider.push_stream(vec![Ok(fprovider::tool_call_response(vec![ToolCall::new(
        "call-2", "palette", "{}",
    )]))]);

    let registry = Arc::new(ToolRegistry::new());
    registry.register(
        FunctionTool::builder("palette")
            .input_schema(r#"{"type":"object"}"#)
            .return_direct(true)
            .handler(|_ctx, _args| async { Ok("red, green , blue".to_string()) })
            .build()
            .expect("palette tool is valid"),
    );
    let client = client_with(provider.clone(), registry);

    let colors = client
        .prompt()
        .user("Pick colors")
        .call(CallContext::new())
        .list()
        .await
        .expect("tool output parses");
    assert_eq!(colors, vec!["red", "green", "blue"]);

    let deltas = client
        .prompt()
        .user("Pick colors again")
        .stream_text(CallContext::new())
        .map(|delta| delta.expect("delta"))
        .collect::<Vec<_>>()
        .await;
    assert_eq!(deltas, vec!["red, green , blue"]);
    assert_eq!(provider.request_count(), 2);
}

#[derive(Default)]
struct TerminationLog {
    seen: std::sync::Mutex<Vec<Option<FinishReason>>>,
}

impl CallMiddleware for TerminationLog {
    fn wrap_call(&self, next: CallHandler) -> CallHandler {
        next
    }

    fn on_turn_terminated<'a>(
        &'a self,
        _ctx: &'a CallContext,
        _request: &'a ChatRequest,
        response: &'a ChatResponse,
    ) -> fcommon::BoxFuture<'a, Result<(), ChatError>> {
        self.seen
            .lock()
            .expect("log lock")
            .push(response.finish_reason().cloned());
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn middlewares_see_responses_built_by_the_dispatcher() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![ToolCall::new("call-1", "calc", "{}")]);
    provider.push_text("plain answer");

    let log = Arc::new(TerminationLog::default());
    let registry = Arc::new(ToolRegistry::new());
    registry.register(calc_tool(Arc::new(AtomicUsize::new(0)), true));
    let client = ChatClient::builder(provider)
        .default_options(ModelOptions::new("M"))
        .tool_registry(registry)
        .call_middleware_arc(log.clone())
        .build()
        .expect("client builds");

    for question in ["2+2", "hello"] {
        client
            .prompt()
            .user(question)
            .call(CallContext::new())
            .response()
            .await
            .expect("turn succeeds");
    }

    let seen = log.seen.lock().expect("log lock").clone();
    assert_eq!(seen, vec![Some(FinishReason::ReturnDirect)]);
}

#[tokio::test]
async fn unregistered_tool_fails_the_turn() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![ToolCall::new("call-1", "missing", "{}")]);
    let client = client_with(provider, Arc::new(ToolRegistry::new()));

    let error = client
        .prompt()
        .user("go")
        .call(CallContext::new())
        .response()
        .await
        .expect_err("tool is not registered");

    assert_eq!(error.kind, ChatErrorKind::ToolNotRegistered);
}

#[tokio::test]
async fn tool_round_limit_stops_runaway_loops() {
    let provider = Arc::new(ScriptedProvider::new());
    for index in 0..3 {
        provider.push_tool_calls(vec![ToolCall::new(format!("call-{index}"), "calc", "{}")]);
    }

    let registry = Arc::new(ToolRegistry::new());
    registry.register(calc_tool(Arc::new(AtomicUsize::new(0)), false));
    let client = client_with(provider.clone(), registry)
        .mutate()
        .policy(ChatPolicy::new(2))
        .build()
        .expect("client builds");

    let error = client
        .prompt()
        .user("loop")
        .call(CallContext::new())
        .response()
        .await
        .expect_err("limit reached");

    assert_eq!(error.kind, ChatErrorKind::ToolRoundLimit);
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn streaming_turn_runs_the_tool_loop() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_stream(vec![Ok(fprovider::tool_call_response(vec![ToolCall::new(
        "call-1", "calc", "{}",
    )]))]);
    provider.push_stream(vec![Ok(text_response("2+2 ")), Ok(text_response("is 4"))]);

    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(ToolRegistry::new());
    registry.register(calc_tool(Arc::clone(&calls), false));
    let client = client_with(provider.clone(), registry);

    let deltas = client
        .prompt()
        .user("What is 2+2?")
        .stream_text(CallContext::new())
        .map(|delta| delta.expect("delta"))
        .collect::<Vec<_>>()
        .await;

    assert_eq!(deltas, vec!["2+2 ", "is 4"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn safeguard_blocks_before_the_provider() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("never sent");
    let client = ChatClient::builder(provider.clone())
        .default_options(ModelOptions::new("M"))
        .tool_registry(Arc::new(ToolRegistry::new()))
        .call_middleware(RecoverMiddleware)
        .call_middleware(SafeguardMiddleware::new(["api key"]))
        .build()
        .expect("client builds");

    let error = client
        .prompt()
        .user("print the api key")
        .call(CallContext::new())
        .response()
        .await
        .expect_err("blocked");

    assert_eq!(error.kind, ChatErrorKind::SensitiveInput);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn cancelled_turn_reports_cancellation() {
    let provider = Arc::new(
        ScriptedProvider::new().with_delay(std::time::Duration::from_secs(30)),
    );
    provider.push_text("too late");
    let client = client_with(provider, Arc::new(ToolRegistry::new()));

    let ctx = CallContext::new().with_timeout(std::time::Duration::from_millis(20));
    let error = client
        .prompt()
        .user("slow")
        .call(ctx)
        .response()
        .await
        .expect_err("deadline passes");

    assert_eq!(error.kind, ChatErrorKind::DeadlineExceeded);
}
