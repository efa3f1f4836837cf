//! # Conversation Model
//!
//! The in-memory transcript of a single run. Messages are only ever appended,
//! and each message is an ordered list of [`ContentBlock`]s.

use anyhow::{Result, bail};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One segment of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// A request from the model to run a tool. `input` is the raw JSON
    /// argument text exactly as the model produced it.
    ToolUse {
        id: String,
        name: String,
        input: String,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn model(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Model,
            content,
        }
    }

    /// Packages the results of one tool-use turn into a single user message.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: results,
        }
    }

    pub fn has_tool_uses(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// An append-only sequence of messages.
///
/// Every `ToolResult` block must answer a `ToolUse` block that appeared in an
/// earlier message; `push` refuses anything else.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
    #[serde(skip)]
    tool_use_ids: HashSet<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) -> Result<()> {
        for block in &message.content {
            if let ContentBlock::ToolResult { tool_use_id, .. } = block {
                if !self.tool_use_ids.contains(tool_use_id) {
                    bail!("tool result references unknown tool invocation '{tool_use_id}'");
                }
            }
        }
        for block in &message.content {
            if let ContentBlock::ToolUse { id, .. } = block {
                self.tool_use_ids.insert(id.clone());
            }
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
