use crate::config::Config;
use crate::conversation::{ContentBlock, Conversation, Message};
use crate::gateway::InferenceGateway;
use crate::tool_registry::ToolRegistry;
use crate::tools::{ToolContext, ToolDeclaration};
use crate::ui;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Source of operator lines. `None` means end of input.
#[async_trait]
pub trait UserInput: Send {
    async fn next_line(&mut self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitUserInput,
    ProcessToolResults,
}

pub struct Agent {
    gateway: Box<dyn InferenceGateway>,
    registry: ToolRegistry,
    ctx: ToolContext,
    conversation: Conversation,
    timeout: Duration,
    print_messages: bool,
}

impl Agent {
    pub fn new(
        gateway: Box<dyn InferenceGateway>,
        registry: ToolRegistry,
        ctx: ToolContext,
        config: &Config,
    ) -> Self {
        Self {
            gateway,
            registry,
            ctx,
            conversation: Conversation::new(),
            timeout: Duration::from_secs(config.timeout_seconds),
            print_messages: config.print_messages,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Drives the conversation until the input is exhausted.
    ///
    /// Returns `Ok` on end of input. A failed inference call ends the run with
    /// its error; failed tools only ever produce error results for the model.
    pub async fn run(&mut self, input: &mut dyn UserInput) -> Result<()> {
        let declarations = self.registry.declarations();
        let mut state = LoopState::AwaitUserInput;

        loop {
            if state == LoopState::AwaitUserInput {
                let Some(line) = input.next_line().await else {
                    info!(messages = self.conversation.len(), "end of input");
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                self.conversation.push(Message::user_text(line))?;
            }

            let response = self.infer(&declarations).await?;
            self.conversation.push(response.clone())?;

            let results = self.handle_response(&response).await;
            if results.is_empty() {
                state = LoopState::AwaitUserInput;
            } else {
                debug!(results = results.len(), "sending tool results");
                self.conversation.push(Message::tool_results(results))?;
                state = LoopState::ProcessToolResults;
            }
        }
    }

    async fn infer(&self, declarations: &[ToolDeclaration]) -> Result<Message> {
        if self.print_messages {
            println!(
                "{}",
                console::style("Messages being sent to API:").yellow().bold()
            );
            let dump = serde_json::to_string_pretty(self.conversation.messages())
                .unwrap_or_else(|e| format!("Failed to serialize messages: {e}"));
            println!("{dump}");
        }

        debug!(messages = self.conversation.len(), "invoking inference gateway");
        tokio::time::timeout(
            self.timeout,
            self.gateway.infer(&self.conversation, declarations),
        )
        .await
        .map_err(|_| anyhow!("inference timed out after {}s", self.timeout.as_secs()))?
        .context("inference request failed")
    }

    /// Shows the model's text and runs its tool invocations in order,
    /// returning one result block per invocation.
    async fn handle_response(&self, response: &Message) -> Vec<ContentBlock> {
        let mut results = Vec::new();
        for block in &response.content {
            match block {
                ContentBlock::Text { text } => ui::print_model_text(text),
                ContentBlock::ToolUse { id, name, input } => {
                    ui::print_tool_invocation(name, input);
                    results.push(self.registry.dispatch(id, name, input, &self.ctx).await);
                }
                ContentBlock::ToolResult { .. } => {}
            }
        }
        results
    }
}
