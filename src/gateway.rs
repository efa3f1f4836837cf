//! # Inference Gateway
//!
//! The boundary to the remote model. The conversation loop only sees the
//! [`InferenceGateway`] trait; [`OpenRouterGateway`] implements it on top of an
//! OpenAI-compatible chat-completions endpoint.
//!
//! Translating between the two worlds:
//!
//! - user text blocks become one `user` message;
//! - a model message becomes an `assistant` message whose tool invocations are
//!   carried as `tool_calls`;
//! - each tool result becomes its own `tool` message tied to the call id.

use crate::config::Config;
use crate::conversation::{ContentBlock, Conversation, Message, Role};
use crate::streaming_executor;
use crate::tools::ToolDeclaration;
use anyhow::Result;
use async_trait::async_trait;
use openrouter_api::models::tool::{FunctionCall, FunctionDescription, Tool as ApiTool, ToolCall};
use openrouter_api::types::chat::{ChatCompletionRequest, Message as ApiMessage};
use openrouter_api::{OpenRouterClient, Ready};
use tracing::debug;

#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Sends the whole conversation plus the tool declarations and returns the
    /// model's next message. Any error here is fatal to the run.
    async fn infer(&self, conversation: &Conversation, tools: &[ToolDeclaration])
    -> Result<Message>;
}

pub struct OpenRouterGateway {
    client: OpenRouterClient<Ready>,
    model: String,
    system_prompt: Option<String>,
}

impl OpenRouterGateway {
    pub fn new(client: OpenRouterClient<Ready>, config: &Config) -> Self {
        Self {
            client,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

#[async_trait]
impl InferenceGateway for OpenRouterGateway {
    async fn infer(
        &self,
        conversation: &Conversation,
        tools: &[ToolDeclaration],
    ) -> Result<Message> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: to_api_messages(self.system_prompt.as_deref(), conversation),
            tools: Some(tools.iter().map(to_api_tool).collect()),
            stream: Some(true),
            response_format: None,
            provider: None,
            models: None,
            transforms: None,
        };
        debug!(model = %self.model, messages = request.messages.len(), "sending chat completion request");

        let response = streaming_executor::stream_and_collect_response(&self.client, request).await?;
        Ok(match response {
            Some(message) => from_api_message(message, conversation.len()),
            None => Message::model(Vec::new()),
        })
    }
}

fn api_message(role: &str, content: String) -> ApiMessage {
    ApiMessage {
        role: role.to_string(),
        content,
        name: None,
        tool_calls: None,
        tool_call_id: None,
    }
}

pub fn to_api_tool(declaration: &ToolDeclaration) -> ApiTool {
    ApiTool::Function {
        function: FunctionDescription {
            name: declaration.name.clone(),
            description: Some(declaration.description.clone()),
            strict: None,
            parameters: declaration.input_schema.clone(),
        },
    }
}

pub fn to_api_messages(system_prompt: Option<&str>, conversation: &Conversation) -> Vec<ApiMessage> {
    let mut messages = Vec::new();
    if let Some(prompt) = system_prompt {
        messages.push(api_message("system", prompt.to_string()));
    }

    for message in conversation.messages() {
        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();

        for block in &message.content {
            match block {
                ContentBlock::Text { text } => texts.push(text.as_str()),
                ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id: id.clone(),
                    kind: "function".to_string(),
                    function_call: FunctionCall {
                        name: name.clone(),
                        arguments: input.clone(),
                    },
                }),
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    let content = if *is_error {
                        format!("Error: {content}")
                    } else {
                        content.clone()
                    };
                    messages.push(ApiMessage {
                        tool_call_id: Some(tool_use_id.clone()),
                        ..api_message("tool", content)
                    });
                }
            }
        }

        match message.role {
            Role::User => {
                if !texts.is_empty() {
                    messages.push(api_message("user", texts.join("\n")));
                }
            }
            // An assistant turn needs content or tool calls to be accepted.
            Role::Model if texts.is_empty() && tool_calls.is_empty() => {}
            Role::Model => {
                messages.push(ApiMessage {
                    tool_calls: if tool_calls.is_empty() {
                        None
                    } else {
                        Some(tool_calls)
                    },
                    ..api_message("assistant", texts.join("\n"))
                });
            }
        }
    }
    messages
}

/// Turns an assistant message into content blocks: the text first (if any),
/// then the tool invocations in the order they were streamed.
///
/// `position` is the index the message will take in the conversation. Calls
/// the service left without an id are named after it, so ids stay unique
/// across the whole run.
pub fn from_api_message(message: ApiMessage, position: usize) -> Message {
    let mut content = Vec::new();
    if !message.content.is_empty() {
        content.push(ContentBlock::Text {
            text: message.content,
        });
    }
    for (index, call) in message.tool_calls.unwrap_or_default().into_iter().enumerate() {
        let id = if call.id.is_empty() {
            format!("call_{position}_{index}")
        } else {
            call.id
        };
        content.push(ContentBlock::ToolUse {
            id,
            name: call.function_call.name,
            input: call.function_call.arguments,
        });
    }
    Message::model(content)
}
