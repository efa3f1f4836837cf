use crate::config::Config;
use anyhow::{Result, bail};
use openrouter_api::{OpenRouterClient, Ready};
use std::time::Duration;

/// Placeholder key for backends that do not authenticate.
const UNUSED_API_KEY: &str =
    "sk-or-v1-0000000000000000000000000000000000000000000000000000000000000000";

pub fn initialize_client(config: &Config) -> Result<OpenRouterClient<Ready>> {
    let api_key = match config.backend.config().api_key_env_var {
        Some(env_var) => match std::env::var(env_var) {
            Ok(val) => val,
            Err(_) => bail!("environment variable {env_var} not set"),
        },
        None => UNUSED_API_KEY.to_string(),
    };
    let client = OpenRouterClient::new()
        .with_base_url(&config.base_url())?
        .with_timeout(Duration::from_secs(config.timeout_seconds))
        .with_api_key(api_key)?;
    Ok(client)
}
