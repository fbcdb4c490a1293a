//! Deployment secrets: the shared login password and the default API key.
//!
//! Read from `secrets.json` in the config directory:
//!
//! ```json
//! { "PASSWORD": "...", "PERPLEXITY_API_KEY": "pplx-..." }
//! ```
//!
//! Environment variables win over the file. Blank values count as absent.
//! Anything else is kept exactly as written.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

pub const SECRETS_FILE: &str = "secrets.json";
pub const PASSWORD_ENV: &str = "RESEARCH_ASSISTANT_PASSWORD";
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(rename = "PASSWORD", default)]
    password: Option<String>,
    #[serde(rename = "PERPLEXITY_API_KEY", default)]
    perplexity_api_key: Option<String>,
}

#[derive(Default)]
pub struct DeploymentSecrets {
    password: Option<Zeroizing<String>>,
    default_api_key: Option<Zeroizing<String>>,
}

impl DeploymentSecrets {
    #[cfg(test)]
    pub fn new(password: Option<&str>, default_api_key: Option<&str>) -> Self {
        Self {
            password: non_empty(password.map(str::to_string)),
            default_api_key: non_empty(default_api_key.map(str::to_string)),
        }
    }

    /// Load `path` (if present) and apply environment overrides.
    pub fn load(path: &Path) -> Self {
        Self::from_sources(read_file(path), |key| std::env::var(key).ok())
    }

    fn from_sources(file: SecretsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let password = non_empty(env(PASSWORD_ENV)).or_else(|| non_empty(file.password));
        let default_api_key =
            non_empty(env(API_KEY_ENV)).or_else(|| non_empty(file.perplexity_api_key));
        tracing::info!(
            password = password.is_some(),
            default_api_key = default_api_key.is_some(),
            "deployment secrets loaded"
        );
        Self {
            password,
            default_api_key,
        }
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }

    pub fn default_api_key(&self) -> Option<&str> {
        self.default_api_key.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for DeploymentSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentSecrets")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "default_api_key",
                &self.default_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<Zeroizing<String>> {
    value.filter(|v| !v.trim().is_empty()).map(Zeroizing::new)
}

fn read_file(path: &Path) -> SecretsFile {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no secrets file");
        return SecretsFile::default();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<SecretsFile>(&raw).map_err(|e| e.to_string()));
    match parsed {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable secrets file");
            SecretsFile::default()
        }
    }
}
