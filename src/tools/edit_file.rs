use crate::{
    diff,
    file_editor::{EditRequest, apply_edit},
    tools::{Tool, ToolContext, ToolDeclaration, parse_args},
};
use anyhow::Result;
use async_trait::async_trait;
use console::style;
use serde_json::Value;

pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &'static str {
        "edit_file"
    }

    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: r#"Edit a text file deterministically.
- mode=replace_once: replace old_str with new_str exactly expect_count times (default 1). If the match count differs, nothing is changed and the message reports the observed count.
- mode=write_full: write new_str as the entire file (use for creating files or full rewrites).
- mode=append: append new_str to the end of the file. With ensure_trailing_newline=true, a newline is added first if the file does not end with one.
- If expect_hash is set and does not match the SHA-256 of the file's current content, nothing is changed (message expect_hash_mismatch).
Returns JSON with changed, old_hash, new_hash, replacements and message.
If no change would occur, the call succeeds with changed=false. Do NOT repeat the same edit in that case."#
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Relative path to the file (inside the working directory)."
                    },
                    "mode": {
                        "enum": ["replace_once", "write_full", "append"],
                        "description": "How to edit the file."
                    },
                    "old_str": {
                        "type": "string",
                        "description": "Exact text to replace (required for replace_once)."
                    },
                    "new_str": {
                        "type": "string",
                        "description": "Text to write or replace with."
                    },
                    "expect_count": {
                        "type": "integer",
                        "description": "Expected number of matches for replace_once (default 1)."
                    },
                    "expect_hash": {
                        "type": "string",
                        "description": "Optional SHA-256 of the current file content. If it does not match, no change is made."
                    },
                    "ensure_trailing_newline": {
                        "type": "boolean",
                        "description": "If true and mode=append, ensures a newline before appending."
                    }
                },
                "required": ["path", "mode"]
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let request: EditRequest = parse_args(self.name(), args)?;
        let applied = apply_edit(&ctx.root, &request)?;

        if applied.outcome.changed {
            println!("[{}]", style(format!("edit: {}", request.path)).magenta());
            println!(
                "{}",
                diff::generate_diff(
                    &String::from_utf8_lossy(&applied.previous),
                    &String::from_utf8_lossy(&applied.current),
                )
            );
        }

        Ok(serde_json::to_string(&applied.outcome)?)
    }
}
