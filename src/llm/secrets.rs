use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};

use crate::palette::Palette;
use crate::utils::{get_data_dir, strip_controls_and_escapes, trim_line};

pub const API_KEY_ENV: &str = "FLASHGEN_API_KEY";

const AUTH_FILE_NAME: &str = "auth.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    AuthFile,
}

impl ApiKeySource {
    pub fn description(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::AuthFile => "local auth file",
        }
    }
}

#[derive(Debug)]
pub struct ApiKeyLookup {
    pub api_key: String,
    pub source: ApiKeySource,
}

/// Keys are stored per provider so an OpenAI key and a Groq key can live
/// side by side.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthFile {
    #[serde(flatten)]
    providers: HashMap<String, ProviderAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderAuth {
    key: String,
}

/// Provider name for an endpoint: its host, e.g. `api.groq.com`.
pub fn provider_for(endpoint: &str) -> String {
    reqwest::Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| endpoint.to_string())
}

/// The JSON file holding API keys.
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
}

impl AuthStore {
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(get_data_dir()?.join(AUTH_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn store(&self, provider: &str, api_key: &str) -> Result<()> {
        let trimmed = trim_line(api_key).with_context(|| "Cannot store an empty API key")?;

        let mut auth = read_auth_file(&self.path)?.unwrap_or_default();
        auth.providers.insert(
            provider.to_string(),
            ProviderAuth {
                key: trimmed.to_string(),
            },
        );

        write_auth_file(&self.path, &auth)
    }

    pub fn clear(&self, provider: &str) -> Result<bool> {
        let Some(mut auth) = read_auth_file(&self.path)? else {
            return Ok(false);
        };

        if auth.providers.remove(provider).is_none() {
            return Ok(false);
        }

        if auth.providers.is_empty() {
            fs::remove_file(&self.path).with_context(|| {
                format!(
                    "Failed to remove empty auth file at {}",
                    self.path.display()
                )
            })?;
            return Ok(true);
        }

        write_auth_file(&self.path, &auth)?;
        Ok(true)
    }

    pub fn get(&self, provider: &str) -> Result<Option<String>> {
        let Some(auth) = read_auth_file(&self.path)? else {
            return Ok(None);
        };

        Ok(auth
            .providers
            .get(provider)
            .map(|entry| entry.key.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string))
    }

    /// Environment variable first, then the auth file.
    pub fn lookup(&self, provider: &str) -> Result<Option<ApiKeyLookup>> {
        if let Ok(value) = env::var(API_KEY_ENV)
            && !value.trim().is_empty()
        {
            return Ok(Some(ApiKeyLookup {
                api_key: value.trim().to_string(),
                source: ApiKeySource::Environment,
            }));
        }

        Ok(self.get(provider)?.map(|api_key| ApiKeyLookup {
            api_key,
            source: ApiKeySource::AuthFile,
        }))
    }
}

pub fn prompt_for_api_key(provider: &str) -> Result<String> {
    println!(
        "\n{} for {} to generate flashcards. It's stored locally for future use.",
        Palette::paint(Palette::SUCCESS, "Enter your API key"),
        Palette::paint(Palette::ACCENT, provider)
    );
    println!(
        "{}",
        Palette::dim(format!(
            "You can also set {API_KEY_ENV}. Leave the field blank to cancel."
        ))
    );
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;

    let password = strip_controls_and_escapes(&raw_password);
    Ok(password.trim().to_string())
}

fn read_auth_file(path: &Path) -> Result<Option<AuthFile>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_auth_contents(&contents, path)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read auth file at {}", path.display()))
        }
    }
}

fn write_auth_file(path: &Path, value: &AuthFile) -> Result<()> {
    let contents = serialize_auth(value)?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write auth file at {}", path.display()))?;
    Ok(())
}

fn parse_auth_contents(contents: &str, path: &Path) -> Result<Option<AuthFile>> {
    if contents.trim().is_empty() {
        return Ok(Some(AuthFile::default()));
    }

    let parsed: AuthFile = serde_json::from_str(contents)
        .with_context(|| format!("Failed to parse auth file at {}", path.display()))?;
    Ok(Some(parsed))
}

fn serialize_auth(value: &AuthFile) -> Result<String> {
    let contents = serde_json::to_string_pretty(value)?;
    Ok(format!("{}\n", contents))
}
