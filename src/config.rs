//! Runtime settings, read from the environment at startup.
//!
//! A `.env` file in the working directory is honoured outside of tests.

use std::time::Duration;

use crate::entitlement::{Tier, UsagePolicy};
use crate::pipeline::FallbackPolicy;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_UPGRADE_URL: &str = "https://www.patreon.com/checkout/FunkyDev";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Parameters sent with every completion request.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub system_prompt: bool,
    pub request_timeout: Option<Duration>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            system_prompt: true,
            request_timeout: None,
        }
    }
}

impl GenerationSettings {
    /// Base URL of the OpenAI-compatible API, i.e. the endpoint without the
    /// trailing `/chat/completions`.
    pub fn api_base(&self) -> &str {
        let endpoint = self.endpoint.trim_end_matches('/');
        endpoint
            .strip_suffix("/chat/completions")
            .unwrap_or(endpoint)
    }
}

/// The signed-in user, as reported by whatever authenticates the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
}

impl Identity {
    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub generation: GenerationSettings,
    pub fallback: FallbackPolicy,
    pub identity: Identity,
    pub tier: Tier,
    pub usage: UsagePolicy,
    pub upgrade_url: String,
    pub log_filter: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let endpoint = var("FLASHGEN_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(invalid("FLASHGEN_ENDPOINT", "expected an http(s) URL"));
        }
        let model = var("FLASHGEN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = match var("FLASHGEN_TEMPERATURE") {
            Some(raw) => {
                let value: f32 = raw
                    .parse()
                    .map_err(|_| invalid("FLASHGEN_TEMPERATURE", format!("'{raw}' is not a number")))?;
                if !(0.0..=2.0).contains(&value) {
                    return Err(invalid(
                        "FLASHGEN_TEMPERATURE",
                        format!("{value} is outside 0.0..=2.0"),
                    ));
                }
                value
            }
            None => DEFAULT_TEMPERATURE,
        };

        let max_tokens = match var("FLASHGEN_MAX_TOKENS") {
            Some(raw) => {
                let value: u32 = raw
                    .parse()
                    .map_err(|_| invalid("FLASHGEN_MAX_TOKENS", format!("'{raw}' is not a count")))?;
                (value > 0).then_some(value)
            }
            None => Some(DEFAULT_MAX_TOKENS),
        };

        let system_prompt = match var("FLASHGEN_SYSTEM_PROMPT") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                invalid("FLASHGEN_SYSTEM_PROMPT", format!("'{raw}' is not a boolean"))
            })?,
            None => true,
        };

        let request_timeout = match var("FLASHGEN_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    invalid("FLASHGEN_REQUEST_TIMEOUT_SECS", format!("'{raw}' is not a number"))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let fallback = match var("FLASHGEN_FALLBACK") {
            Some(raw) => raw
                .parse::<FallbackPolicy>()
                .map_err(|e| invalid("FLASHGEN_FALLBACK", e))?,
            None => FallbackPolicy::default(),
        };

        let tier = match var("FLASHGEN_TIER") {
            Some(raw) => raw.parse::<Tier>().map_err(|e| invalid("FLASHGEN_TIER", e))?,
            None => Tier::Free,
        };

        let usage = match var("FLASHGEN_FREE_DAILY_LIMIT") {
            Some(raw) => UsagePolicy {
                free_daily_limit: raw.parse().map_err(|_| {
                    invalid("FLASHGEN_FREE_DAILY_LIMIT", format!("'{raw}' is not a count"))
                })?,
            },
            None => UsagePolicy::default(),
        };

        Ok(Self {
            generation: GenerationSettings {
                endpoint,
                model,
                temperature,
                max_tokens,
                system_prompt,
                request_timeout,
            },
            fallback,
            identity: Identity {
                user_id: var("FLASHGEN_USER_ID"),
            },
            tier,
            usage,
            upgrade_url: var("FLASHGEN_UPGRADE_URL")
                .unwrap_or_else(|| DEFAULT_UPGRADE_URL.to_string()),
            log_filter: var("FLASHGEN_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

fn invalid(name: &str, detail: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue(name.to_string(), detail.into())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.generation, GenerationSettings::default());
        assert_eq!(settings.fallback, FallbackPolicy::DefaultDeck);
        assert_eq!(settings.tier, Tier::Free);
        assert_eq!(settings.usage.free_daily_limit, 3);
        assert!(!settings.identity.is_signed_in());
        assert_eq!(settings.log_filter, "warn");
    }

    #[test]
    fn groq_style_overrides() {
        let settings = settings_from(&[
            ("FLASHGEN_ENDPOINT", "https://api.groq.com/openai/v1/chat/completions"),
            ("FLASHGEN_MODEL", "llama3-8b-8192"),
            ("FLASHGEN_TEMPERATURE", "0.2"),
            ("FLASHGEN_MAX_TOKENS", "0"),
            ("FLASHGEN_SYSTEM_PROMPT", "off"),
            ("FLASHGEN_USER_ID", "user_123"),
            ("FLASHGEN_TIER", "premium"),
            ("FLASHGEN_FALLBACK", "notice"),
        ])
        .unwrap();

        assert_eq!(settings.generation.model, "llama3-8b-8192");
        assert_eq!(settings.generation.temperature, 0.2);
        assert_eq!(settings.generation.max_tokens, None);
        assert!(!settings.generation.system_prompt);
        assert_eq!(settings.generation.api_base(), "https://api.groq.com/openai/v1");
        assert_eq!(settings.identity.user_id.as_deref(), Some("user_123"));
        assert_eq!(settings.tier, Tier::Premium);
        assert_eq!(settings.fallback, FallbackPolicy::FailureNotice);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let settings = settings_from(&[("FLASHGEN_USER_ID", "   "), ("FLASHGEN_MODEL", "")]).unwrap();
        assert!(!settings.identity.is_signed_in());
        assert_eq!(settings.generation.model, DEFAULT_MODEL);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings_from(&[("FLASHGEN_TEMPERATURE", "hot")]).is_err());
        assert!(settings_from(&[("FLASHGEN_TEMPERATURE", "3.5")]).is_err());
        assert!(settings_from(&[("FLASHGEN_MAX_TOKENS", "-1")]).is_err());
        assert!(settings_from(&[("FLASHGEN_ENDPOINT", "api.openai.com")]).is_err());
        assert!(settings_from(&[("FLASHGEN_TIER", "gold")]).is_err());
        assert!(settings_from(&[("FLASHGEN_SYSTEM_PROMPT", "maybe")]).is_err());
    }

    #[test]
    fn timeout_is_opt_in() {
        let settings = settings_from(&[("FLASHGEN_REQUEST_TIMEOUT_SECS", "30")]).unwrap();
        assert_eq!(
            settings.generation.request_timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn api_base_without_chat_suffix_is_kept() {
        let settings = GenerationSettings {
            endpoint: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.api_base(), "http://localhost:8080/v1");
    }
}
