//! Tool loop driving a turn through the middleware chain until the model stops calling tools.

use std::sync::Arc;

use fcommon::CallContext;
use fprovider::{ChatRequest, ChatResponse, ResponseAccumulator};
use ftooling::{DispatchOutcome, ToolDispatcher};
use futures_util::StreamExt;
use tracing::debug;

use crate::client::ClientConfig;
use crate::params::set_tool_round;
use crate::{ChatError, ChatPolicy, ChatStream};

enum Step {
    Finish(ChatResponse),
    Terminate(ChatResponse),
    Continue(ChatRequest),
}

pub(crate) async fn run_call(
    config: Arc<ClientConfig>,
    ctx: CallContext,
    request: ChatRequest,
) -> Result<ChatResponse, ChatError> {
    let dispatcher = tool_dispatcher(&config);
    let mut request = request;
    let mut round = 0_usize;

    loop {
        ctx.check()?;
        let response = (config.call_chain)(ctx.clone(), request.clone()).await?;

        match advance(&dispatcher, config.policy, &ctx, &request, response, round).await? {
            Step::Finish(response) => return Ok(response),
            Step::Terminate(response) => {
                for middleware in config.call_middlewares.iter().rev() {
                    middleware
                        .on_turn_terminated(&ctx, &request, &response)
                        .await?;
                }
                return Ok(response);
            }
            Step::Continue(next) => {
                request = next;
                round += 1;
            }
        }
    }
}

/// Streams every chunk of every round. A dispatcher that terminates the turn contributes one
/// final chunk carrying its synthesized response, emitted after every stream middleware has
/// seen it through `on_turn_terminated`.
pub(crate) fn run_stream(
    config: Arc<ClientConfig>,
    ctx: CallContext,
    request: ChatRequest,
) -> ChatStream {
    Box::pin(async_stream::stream! {
        let dispatcher = tool_dispatcher(&config);
        let mut request = request;
        let mut round = 0_usize;

        loop {
            let mut accumulator = ResponseAccumulator::new();
            let mut chunks = (config.stream_chain)(ctx.clone(), request.clone());

            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(chunk) => {
                        accumulator.push(&chunk);
                        yield Ok(chunk);
                    }
                    Err(error) => {
                        yield Err(error);
                        return;
                    }
                }
            }

            let response = accumulator.finish();
            match advance(&dispatcher, config.policy, &ctx, &request, response, round).await {
                Ok(Step::Finish(_)) => return,
                Ok(Step::Terminate(response)) => {
                    for middleware in config.stream_middlewares.iter().rev() {
                        if let Err(error) =
                            middleware.on_turn_terminated(&ctx, &request, &response).await
                        {
                            yield Err(error);
                            return;
                        }
                    }
                    yield Ok(response);
                    return;
                }
                Ok(Step::Continue(next)) => {
                    request = next;
                    round += 1;
                }
                Err(error) => {
                    yield Err(error);
                    return;
                }
            }
        }
    })
}

fn tool_dispatcher(config: &ClientConfig) -> ToolDispatcher {
    ToolDispatcher::new(Arc::clone(&config.registry)).with_hooks(Arc::clone(&config.tool_hooks))
}

async fn advance(
    dispatcher: &ToolDispatcher,
    policy: ChatPolicy,
    ctx: &CallContext,
    request: &ChatRequest,
    response: ChatResponse,
    round: usize,
) -> Result<Step, ChatError> {
    if !dispatcher.can_invoke(&response)? {
        return Ok(Step::Finish(response));
    }

    match dispatcher.dispatch(ctx, request, &response).await? {
        DispatchOutcome::Terminate(response) => {
            debug!(event = "tool_loop_terminate", round = round);
            Ok(Step::Terminate(response))
        }
        DispatchOutcome::Continue(next) => {
            if round >= policy.max_tool_round_trips {
                return Err(ChatError::tool_round_limit(policy.max_tool_round_trips));
            }

            let next_round = round + 1;
            set_tool_round(next.params(), u32::try_from(next_round).unwrap_or(u32::MAX));
            debug!(
                event = "tool_loop_continue",
                round = next_round,
                messages = next.messages().len()
            );
            Ok(Step::Continue(next))
        }
    }
}
