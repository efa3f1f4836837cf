use crate::{
    safe_path,
    tools::{Tool, ToolContext, ToolDeclaration, parse_args},
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fs;

#[derive(Deserialize, Debug)]
pub struct ReadFileArgs {
    pub path: String,
}

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: "Read the contents of a given relative file path. Use this when you want to see what's inside a file. Do not use this with directory names.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The relative path of a file in the working directory."
                    }
                },
                "required": ["path"]
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let args: ReadFileArgs = parse_args(self.name(), args)?;
        let path = safe_path::resolve_in(&ctx.root, &args.path)?;

        let bytes = fs::read(&path)
            .map_err(|e| anyhow!("Failed to read '{}': {e}", args.path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
