//! # Tool Registry
//!
//! The `ToolRegistry` is the central hub for declaring and executing tools.
//! It keeps the tools in registration order, guarantees their names are unique,
//! and dispatches calls to the matching implementation by name.

use crate::{
    conversation::ContentBlock,
    error::ToolError,
    tools::{EditFileTool, ListFilesTool, ReadFileTool, Tool, ToolContext, ToolDeclaration},
};
use anyhow::{Result, anyhow};
use console::style;
use serde_json::Value;
use tracing::{debug, warn};

/// A collection responsible for registering and dispatching tool calls.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates a new, empty `ToolRegistry`.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The registry the agent ships with: `read_file`, `list_files`, `edit_file`.
    pub fn with_default_tools() -> Result<Self, ToolError> {
        let mut registry = Self::new();
        registry.register(Box::new(ReadFileTool))?;
        registry.register(Box::new(ListFilesTool))?;
        registry.register(Box::new(EditFileTool))?;
        Ok(registry)
    }

    /// Registers a new tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(ToolError::DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn Tool, ToolError> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| &**tool)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Gathers the declarations of all registered tools, in registration order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(|tool| tool.declaration()).collect()
    }

    /// Resolves a tool, parses its raw JSON arguments and runs it.
    pub async fn execute(&self, name: &str, raw_input: &str, ctx: &ToolContext) -> Result<String> {
        let tool = self.resolve(name)?;

        let args: Value = if raw_input.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(raw_input)
                .map_err(|e| anyhow!("Failed to parse JSON arguments: {e}"))?
        };

        if ctx.debug_tool_calls {
            let pretty_args = serde_json::to_string_pretty(&args)?;
            println!("{}", style(pretty_args).dim());
        }

        tool.execute(&args, ctx).await
    }

    /// Executes a tool call and returns its result block.
    ///
    /// This never fails from the caller's perspective: unknown tools, bad
    /// arguments and execution errors all come back as a `ToolResult` with
    /// `is_error` set, so the model can see what went wrong and adapt.
    pub async fn dispatch(
        &self,
        tool_use_id: &str,
        name: &str,
        raw_input: &str,
        ctx: &ToolContext,
    ) -> ContentBlock {
        let (content, is_error) = match self.execute(name, raw_input, ctx).await {
            Ok(output) => {
                if ctx.debug_tool_calls {
                    println!("{}", style(format!("Tool output:\n{output}")).dim());
                }
                debug!(tool = name, id = tool_use_id, "tool call succeeded");
                (output, false)
            }
            Err(e) => {
                let error_message = e.to_string();
                warn!(tool = name, id = tool_use_id, error = %error_message, "tool call failed");
                eprintln!(
                    "{}",
                    style(format!("Error executing tool `{name}`: {error_message}")).red()
                );
                (error_message, true)
            }
        };

        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.to_string(),
            content,
            is_error,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::Builder;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn declaration(&self) -> ToolDeclaration {
            ToolDeclaration {
                name: "echo".to_string(),
                description: "Echoes its input.".to_string(),
                input_schema: serde_json::json!({ "type": "object" }),
            }
        }

        async fn execute(&self, args: &Value, _ctx: &ToolContext) -> Result<String> {
            Ok(args.to_string())
        }
    }

    fn ctx() -> (tempfile::TempDir, ToolContext) {
        let tmp_dir = Builder::new().prefix("test-registry").tempdir().unwrap();
        let ctx = ToolContext::new(tmp_dir.path());
        (tmp_dir, ctx)
    }

    #[test]
    fn test_default_tools_are_declared_in_order() {
        let registry = ToolRegistry::with_default_tools().unwrap();
        let names: Vec<String> = registry
            .declarations()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["read_file", "list_files", "edit_file"]);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        let err = registry.register(Box::new(EchoTool)).unwrap_err();

        assert!(matches!(err, ToolError::DuplicateTool(ref name) if name == "echo"));
        assert_eq!(registry.declarations().len(), 1);
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.resolve("nope").err().unwrap();
        assert!(matches!(err, ToolError::NotFound(ref name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_dispatch_wraps_output_in_result_block() {
        let (_tmp_dir, ctx) = ctx();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();

        let block = registry.dispatch("call_1", "echo", r#"{"a":1}"#, &ctx).await;

        assert_eq!(
            block,
            ContentBlock::ToolResult {
                tool_use_id: "call_1".to_string(),
                content: r#"{"a":1}"#.to_string(),
                is_error: false,
            }
        );
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_error_result() {
        let (_tmp_dir, ctx) = ctx();
        let registry = ToolRegistry::with_default_tools().unwrap();

        let block = registry.dispatch("call_2", "delete_everything", "{}", &ctx).await;

        match block {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id, "call_2");
                assert!(is_error);
                assert_eq!(content, "tool not found: delete_everything");
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_malformed_json_is_error_result() {
        let (_tmp_dir, ctx) = ctx();
        let registry = ToolRegistry::with_default_tools().unwrap();

        let block = registry.dispatch("call_3", "read_file", "{not json", &ctx).await;

        assert!(matches!(
            block,
            ContentBlock::ToolResult { is_error: true, ref content, .. }
                if content.starts_with("Failed to parse JSON arguments")
        ));
    }

    #[tokio::test]
    async fn test_empty_arguments_are_an_empty_object() {
        let (tmp_dir, ctx) = ctx();
        std::fs::write(tmp_dir.path().join("a.txt"), "a").unwrap();
        let registry = ToolRegistry::with_default_tools().unwrap();

        let output = registry.execute("list_files", "", &ctx).await.unwrap();

        assert_eq!(output, r#"["a.txt"]"#);
    }

    #[tokio::test]
    async fn test_read_file_result_keeps_escape_bytes() {
        let (tmp_dir, ctx) = ctx();
        let content = "red=\x1b[31mX\x1b[0m\n";
        std::fs::write(tmp_dir.path().join("c.txt"), content).unwrap();
        let registry = ToolRegistry::with_default_tools().unwrap();

        let block = registry
            .dispatch("c1", "read_file", r#"{"path":"c.txt"}"#, &ctx)
            .await;

        assert_eq!(
            block,
            ContentBlock::ToolResult {
                tool_use_id: "c1".to_string(),
                content: content.to_string(),
                is_error: false,
            }
        );
    }
}
