use crate::{
    safe_path,
    tools::{Tool, ToolContext, ToolDeclaration, parse_args},
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use ignore::{WalkBuilder, overrides::OverrideBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Deserialize, Debug, Default)]
pub struct ListFilesArgs {
    #[serde(default)]
    pub path: Option<String>,
}

pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: "List files and directories at a given path, recursively. If no path is provided, lists files in the current directory. Directories end with '/'.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Optional relative path to list files from. Defaults to current directory if not provided."
                    }
                }
            }),
        }
    }

    async fn execute(&self, args: &Value, ctx: &ToolContext) -> Result<String> {
        let args: ListFilesArgs = parse_args(self.name(), args)?;
        let requested = args.path.as_deref().filter(|p| !p.is_empty()).unwrap_or(".");
        let dir = safe_path::resolve_in(&ctx.root, requested)?;

        if !dir.is_dir() {
            return Err(anyhow!(
                "The provided path '{requested}' is not a directory."
            ));
        }

        let entries = walk_entries(&dir, &ctx.ignored_paths)?;
        Ok(serde_json::to_string(&entries)?)
    }
}

/// Walks `dir` recursively and returns every entry relative to it, in
/// traversal order with siblings sorted by name. Directories carry a
/// trailing `/`.
fn walk_entries(dir: &Path, ignored_paths: &[String]) -> Result<Vec<String>> {
    let mut overrides = OverrideBuilder::new(dir);
    for pattern in ignored_paths {
        overrides.add(&format!("!{pattern}"))?;
    }
    let overrides = overrides.build()?;

    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        let relative = entry.path().strip_prefix(dir)?;
        let mut display = relative.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_some_and(|t| t.is_dir()) {
            display.push('/');
        }
        entries.push(display);
    }
    Ok(entries)
}
