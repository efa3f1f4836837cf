//! Typed errors raised by tools and the tool registry.
//!
//! Every variant here is a *tool-level* failure: the registry converts it into a
//! failed tool result that is handed back to the model. None of them abort the
//! conversation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unsafe path '{0}': path must be inside working directory")]
    UnsafePath(String),

    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("a tool named '{0}' is already registered")]
    DuplicateTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{0}")]
    MissingField(String),
}
