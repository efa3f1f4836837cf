//! # Tool Trait
//!
//! This module defines the core `Tool` trait that every tool exposed to the model
//! implements, together with the declaration sent to the model and the context
//! a tool runs in.

use crate::config::Config;
use crate::error::ToolError;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;

pub mod edit_file;
pub mod list_files;
pub mod read_file;
pub use self::edit_file::EditFileTool;
pub use self::list_files::ListFilesTool;
pub use self::read_file::ReadFileTool;

/// What the model is told about a tool: its name, what it does, and the JSON
/// schema its arguments must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Everything a tool needs from its surroundings.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory all tool paths are resolved against.
    pub root: PathBuf,
    /// Glob patterns skipped by `list_files`.
    pub ignored_paths: Vec<String>,
    /// Echo tool arguments and output to the operator.
    pub debug_tool_calls: bool,
}

impl ToolContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored_paths: Vec::new(),
            debug_tool_calls: false,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root: root.into(),
            ignored_paths: config.ignored_paths.clone(),
            debug_tool_calls: config.debug_tool_calls,
        }
    }
}

/// A trait representing a self-contained, executable tool.
///
/// This trait is designed to be object-safe, allowing for dynamic dispatch
/// via `Box<dyn Tool>`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique, static name of the tool.
    fn name(&self) -> &'static str;

    /// Returns the declaration (description and argument schema) sent to the model.
    fn declaration(&self) -> ToolDeclaration;

    /// Executes the tool.
    ///
    /// On success, returns a concise, machine-readable string for the model.
    /// Output meant for the operator (e.g. a diff of an edit) is printed
    /// directly to stdout within this method.
    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String>;
}

/// Deserializes tool arguments into the tool's typed contract.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}
