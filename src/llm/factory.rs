use anyhow::{bail, Result};
use tracing::info;

use super::client::LlmClient;
use super::client::MockLlmClient;
use super::client_impl::{AnthropicClient, GeminiClient, OpenAIClient};
use crate::config::Config;

const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Create an LLM client based on configuration
pub fn create_client(config: &Config, dry_run: bool) -> Result<Box<dyn LlmClient>> {
    if dry_run {
        info!("Dry run: using the mock LLM client");
        return Ok(Box::new(MockLlmClient::new()));
    }

    let api_key = config.get_api_key()?;
    let llm = &config.llm;
    let max_tokens = llm.get_max_tokens();
    let timeout = llm.timeout_secs;

    let client: Box<dyn LlmClient> = match llm.provider.as_str() {
        "anthropic" => {
            let mut client = AnthropicClient::new(api_key, llm.model.clone(), max_tokens, timeout)?;
            if let Some(base_url) = &llm.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Box::new(client)
        }

        "openai" => Box::new(match &llm.base_url {
            Some(base_url) => OpenAIClient::with_base_url(
                api_key,
                llm.model.clone(),
                base_url.clone(),
                max_tokens,
                timeout,
            )?,
            None => OpenAIClient::new(api_key, llm.model.clone(), max_tokens, timeout)?,
        }),

        "openai-compatible" => {
            let base_url = llm
                .base_url
                .clone()
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());

            Box::new(OpenAIClient::with_base_url(
                api_key,
                llm.model.clone(),
                base_url,
                max_tokens,
                timeout,
            )?)
        }

        "gemini" => {
            let mut client = GeminiClient::new(api_key, llm.model.clone(), max_tokens, timeout)?;
            if let Some(base_url) = &llm.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Box::new(client)
        }

        unknown => bail!("Unknown LLM provider: {}", unknown),
    };

    info!("Using {} model {}", llm.provider, llm.model);
    Ok(client)
}
