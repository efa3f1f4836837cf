use crate::backend::Backend;
use crate::cli::Cli;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant working inside the user's current directory.
Use `list_files` and `read_file` to inspect files and `edit_file` to change them.
When `edit_file` reports changed=false, read its message and do not repeat the same edit.
When you have the final answer, provide it directly without using a tool.";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub model: String,
    /// Overrides the backend's default endpoint when non-empty.
    pub base_url: String,
    pub timeout_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub print_messages: bool,
    pub debug_tool_calls: bool,
    pub ignored_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let backend = Backend::default();
        Self {
            backend,
            model: backend.config().default_model.to_string(),
            base_url: String::new(),
            timeout_seconds: 120,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            print_messages: false,
            debug_tool_calls: false,
            ignored_paths: vec![".git".to_string()],
        }
    }
}

impl Config {
    pub fn base_url(&self) -> String {
        if self.base_url.is_empty() {
            self.backend.config().base_url.to_string()
        } else {
            self.base_url.clone()
        }
    }

    /// Applies command-line overrides on top of the loaded file.
    ///
    /// Switching backends without naming a model selects that backend's
    /// default model, since model names are not portable between services.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(backend) = cli.backend {
            if backend != self.backend {
                self.backend = backend;
                self.base_url.clear();
                self.model = backend.config().default_model.to_string();
            }
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
    }
}

fn default_config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::new();
    Ok(xdg_dirs.place_config_file("quill/config.toml")?)
}

/// Loads the config file, creating it with defaults on first run.
///
/// Keys missing from an existing file are filled with their defaults and the
/// completed file is written back, so users can see every available option.
pub fn load(path_override: Option<&Path>) -> Result<Config> {
    let config_path = match path_override {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    load_from(&config_path)
}

pub fn load_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        let default_config = Config::default();
        let toml_string = toml::to_string_pretty(&default_config)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, toml_string)?;

        println!("Created default config at: {}", config_path.display());
        return Ok(default_config);
    }

    let config_string = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
    let mut config: Config = toml::from_str(&config_string)
        .with_context(|| format!("Invalid config file {}", config_path.display()))?;

    if config.model.is_empty() {
        config.model = config.backend.config().default_model.to_string();
    }
    if config.timeout_seconds == 0 {
        config.timeout_seconds = Config::default().timeout_seconds;
    }

    let final_toml_string = toml::to_string_pretty(&config)?;
    if final_toml_string != config_string {
        fs::write(config_path, final_toml_string)?;
    }

    Ok(config)
}
