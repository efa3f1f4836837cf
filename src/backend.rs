use serde::{Deserialize, Serialize};

pub struct BackendConfig {
    pub base_url: &'static str,
    pub api_key_env_var: Option<&'static str>,
    pub default_model: &'static str,
}

/// The OpenAI-compatible chat-completion services the agent can talk to.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Openrouter,
    Ollama,
    Openai,
}

impl Backend {
    pub fn config(&self) -> BackendConfig {
        match self {
            Backend::Openrouter => BackendConfig {
                base_url: "https://openrouter.ai/api/v1/",
                api_key_env_var: Some("OPENROUTER_API_KEY"),
                default_model: "anthropic/claude-3.7-sonnet",
            },
            Backend::Ollama => BackendConfig {
                base_url: "http://localhost:11434/v1/",
                api_key_env_var: None,
                default_model: "qwen2.5-coder",
            },
            Backend::Openai => BackendConfig {
                base_url: "https://api.openai.com/v1/",
                api_key_env_var: Some("OPENAI_API_KEY"),
                default_model: "gpt-4o",
            },
        }
    }
}
