use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fconverse::ffilter::{BinaryOp, Literal};
use fconverse::prelude::*;
use fconverse::FilterErrorKind;
use fconverse::fchat::output_format;

fn client(provider: Arc<ScriptedProvider>, registry: Arc<ToolRegistry>) -> ChatClient {
    chat_client(provider, "M")
        .expect("client builds")
        .mutate()
        .tool_registry(registry)
        .build()
        .expect("client builds")
}

fn kinds(messages: &[Message]) -> Vec<MessageKind> {
    messages.iter().map(Message::kind).collect()
}

#[tokio::test]
async fn s1_single_text_turn() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("Hi there");
    let client = client(provider.clone(), Arc::new(ToolRegistry::new()));

    let text = client
        .prompt()
        .messages(fc_messages![user => "Hi"])
        .call(CallContext::new())
        .text()
        .await
        .expect("turn succeeds");

    assert_eq!(text, "Hi there");
    let sent = provider.last_request().expect("request recorded");
    assert_eq!(sent.messages(), &[fc_msg!(user => "Hi")][..]);
    assert_eq!(sent.options().model, "M");
}

#[tokio::test]
async fn s2_templates_produce_system_and_user() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("Hello, World!");
    let client = client(provider.clone(), Arc::new(ToolRegistry::new()));

    client
        .prompt()
        .system_template(SystemPromptTemplate::new("You are a {role}."))
        .user_template(UserPromptTemplate::new("Say hello to {name}."))
        .var("role", "assistant")
        .var("name", "World")
        .call(CallContext::new())
        .response()
        .await
        .expect("turn succeeds");

    let sent = provider.last_request().expect("request recorded");
    assert_eq!(
        sent.messages(),
        &fc_messages![
            system => "You are a assistant.",
            user => "Say hello to World.",
        ][..]
    );
}

#[tokio::test]
async fn s3_adjacent_messages_merge_and_system_leads() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("ok");
    let client = client(provider.clone(), Arc::new(ToolRegistry::new()));

    let tr1 = ToolReturn::new("1", "calc", "4");
    let tr2 = ToolReturn::new("2", "calc", "9");
    client
        .prompt()
        .messages(fc_messages![user => "a", user => "b", system => "s", user => "c"])
        .message(Message::tool(vec![tr1.clone()]).expect("tool message"))
        .message(Message::tool(vec![tr2.clone()]).expect("tool message"))
        .call(CallContext::new())
        .response()
        .await
        .expect("turn succeeds");

    let sent = provider.last_request().expect("request recorded");
    let messages = sent.messages();
    assert_eq!(
        kinds(messages),
        vec![
            MessageKind::System,
            MessageKind::User,
            MessageKind::User,
            MessageKind::Tool
        ]
    );
    assert_eq!(messages[0].text(), "s");
    assert_eq!(messages[1].text(), "a\n\nb");
    assert_eq!(messages[2].text(), "c");
    assert_eq!(
        messages[3].as_tool().expect("tool message").returns(),
        &[tr1, tr2][..]
    );
}

#[tokio::test]
async fn s4_list_parser_splits_and_trims() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_text("red, green , blue");
    let client = client(provider.clone(), Arc::new(ToolRegistry::new()));

    let colors = client
        .prompt()
        .user("Name three colors.")
        .call(CallContext::new())
        .list()
        .await
        .expect("list parses");

    assert_eq!(colors, vec!["red", "green", "blue"]);

    let sent = provider.last_request().expect("request recorded");
    assert!(output_format(sent.params()).is_some());
    assert!(sent.messages()[0].text().starts_with("Name three colors."));
}

#[tokio::test]
async fn s5_internal_tool_result_continues_the_turn() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![ToolCall::new("call-1", "calc", r#"{"expr":"2+2"}"#)]);
    provider.push_text("2+2 is 4");

    let executions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&executions);
    let registry = Arc::new(ToolRegistry::new());
    registry.register(
        FunctionTool::builder("calc")
            .description("Evaluates arithmetic")
            .input_schema(r#"{"type":"object","properties":{"expr":{"type":"string"}}}"#)
            .handler(move |_ctx, _args| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok("4".to_string()) }
            })
            .build()
            .expect("calc tool is valid"),
    );
    let client = client(provider.clone(), registry);

    let text = client
        .prompt()
        .user("What is 2+2?")
        .call(CallContext::new())
        .text()
        .await
        .expect("turn succeeds");

    assert_eq!(text, "2+2 is 4");
    assert_eq!(executions.load(Ordering::SeqCst), 1);

    let continuation = provider.last_request().expect("continuation recorded");
    let messages = continuation.messages();
    assert_eq!(
        kinds(messages),
        vec![MessageKind::User, MessageKind::Assistant, MessageKind::Tool]
    );
    assert!(
        messages[1]
            .as_assistant()
            .is_some_and(|assistant| assistant.has_tool_calls())
    );
    assert_eq!(
        messages[2].as_tool().expect("tool message").returns(),
        &[ToolReturn::new("call-1", "calc", "4")][..]
    );
}

#[tokio::test]
async fn s6_external_tool_terminates_and_memory_keeps_user_and_assistant() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_tool_calls(vec![ToolCall::new(
        "call-1",
        "ui_prompt",
        r#"{"question":"Ship it?"}"#,
    )]);

    let registry = Arc::new(ToolRegistry::new());
    registry.register(
        ExternalTool::builder("ui_prompt")
            .description("Asks the human")
            .input_schema(r#"{"type":"object"}"#)
            .build()
            .expect("ui tool is valid"),
    );

    let store = Arc::new(InMemoryConversationMemory::new());
    let client = chat_client_with_memory(provider.clone(), "M", store.clone())
        .expect("client builds")
        .mutate()
        .tool_registry(registry)
        .build()
        .expect("client builds");

    let response = client
        .prompt()
        .user("Deploy the release")
        .conversation_id("c-6")
        .call(CallContext::new())
        .response()
        .await
        .expect("turn terminates");

    let names = response
        .tool_calls()
        .iter()
        .map(|call| call.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["ui_prompt"]);
    assert_eq!(provider.request_count(), 1);

    let history = store
        .read(&CallContext::new(), &ConversationId::from("c-6"))
        .await
        .expect("store readable");
    assert_eq!(
        kinds(&history),
        vec![MessageKind::User, MessageKind::Assistant]
    );
}

#[test]
fn s7_filter_expressions() {
    let expr = parse_filter("a == 1 AND b IN (2, 3)").expect("valid filter");
    assert_eq!(
        expr,
        Expr::binary(
            BinaryOp::And,
            Expr::binary(BinaryOp::Eq, Expr::ident("a"), Expr::literal(1)),
            Expr::binary(
                BinaryOp::In,
                Expr::ident("b"),
                Expr::list([Literal::from(2), Literal::from(3)]),
            ),
        )
    );

    let failures = [
        ("a IN (1, 'x')", FilterErrorKind::TypeMismatch),
        ("a IN ()", FilterErrorKind::EmptyParentheses),
        ("arr[true]", FilterErrorKind::InvalidIndexType),
    ];
    for (text, expected) in failures {
        assert_eq!(parse_filter(text).expect_err(text).kind, expected);
    }
}
