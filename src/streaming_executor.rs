use anyhow::Result;
use futures::StreamExt;
use openrouter_api::{OpenRouterClient, Ready, models::tool::ToolCall, types::chat::*};
use tracing::debug;

/// Sends `request` on the streaming endpoint and collects the deltas into a
/// single assistant message. Returns `None` when the model produced nothing.
pub async fn stream_and_collect_response(
    client: &OpenRouterClient<Ready>,
    mut request: ChatCompletionRequest,
) -> Result<Option<Message>> {
    request.stream = Some(true);
    let mut stream = client.chat()?.chat_completion_stream(request);

    let mut content = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();
    let mut chunks = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        chunks += 1;
        let choice = chunk.choices.first();

        if let Some(c) = choice.and_then(|c| c.delta.content.as_deref()) {
            content.push_str(c);
        }

        if let Some(tool_call_chunks) = choice.and_then(|c| c.delta.tool_calls.as_ref()) {
            merge_tool_call_chunks(&mut tool_calls, tool_call_chunks);
        }
    }
    debug!(chunks, tool_calls = tool_calls.len(), "response stream finished");

    if content.is_empty() && tool_calls.is_empty() {
        return Ok(None);
    }

    Ok(Some(Message {
        role: "assistant".to_string(),
        content,
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        name: None,
        tool_call_id: None,
    }))
}

/// The stream can split one tool call over several chunks. A chunk without an
/// id continues the arguments of the call before it.
fn merge_tool_call_chunks(tool_calls: &mut Vec<ToolCall>, chunks: &[ToolCall]) {
    for chunk in chunks {
        match tool_calls.last_mut() {
            Some(last) if chunk.id.is_empty() => {
                last.function_call
                    .arguments
                    .push_str(&chunk.function_call.arguments);
            }
            _ => tool_calls.push(chunk.clone()),
        }
    }
}
