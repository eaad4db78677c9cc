use anyhow::{Context, Result, bail};
use async_openai::{Client, config::OpenAIConfig};
use tracing::debug;

use super::completion::ChatCompletionClient;
use super::secrets::{API_KEY_ENV, ApiKeySource, AuthStore, prompt_for_api_key, provider_for};
use crate::config::GenerationSettings;

/// Builds a completion client, asking for a key (and storing it) when none is
/// configured for the endpoint's provider.
pub fn ensure_client(settings: &GenerationSettings, store: &AuthStore) -> Result<ChatCompletionClient> {
    let provider = provider_for(&settings.endpoint);
    let key = match store.lookup(&provider)? {
        Some(lookup) => {
            debug!(provider = %provider, source = lookup.source.description(), "using stored API key");
            lookup.api_key
        }
        None => {
            let api_key = prompt_for_api_key(&provider)?;
            if api_key.is_empty() {
                bail!(
                    "No API key provided. Set {} or run `flashgen llm --set <KEY>`.",
                    API_KEY_ENV
                );
            }
            store.store(&provider, &api_key)?;
            api_key
        }
    };

    ChatCompletionClient::new(settings, key).context("Failed to build HTTP client")
}

/// Verifies the configured key by listing models at the provider's API base.
pub async fn test_configured_api_key(
    settings: &GenerationSettings,
    store: &AuthStore,
) -> Result<ApiKeySource> {
    let provider = provider_for(&settings.endpoint);
    let lookup = store.lookup(&provider)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for {provider}. Set {} or run `flashgen llm --set <KEY>`.",
            API_KEY_ENV
        )
    })?;

    let config = OpenAIConfig::new()
        .with_api_key(lookup.api_key)
        .with_api_base(settings.api_base());
    let client = Client::with_config(config);
    client
        .models()
        .list()
        .await
        .with_context(|| format!("Failed to validate API key with {provider}"))?;

    Ok(lookup.source)
}
