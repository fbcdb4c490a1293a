//! Runtime configuration resolved from the environment.
//!
//! | Variable                         | Meaning                               |
//! |----------------------------------|---------------------------------------|
//! | `RESEARCH_ASSISTANT_DATA_DIR`    | where conversations are stored        |
//! | `RESEARCH_ASSISTANT_STORE`       | `json` (default), `sqlite` or `memory` |
//! | `RESEARCH_ASSISTANT_API_URL`     | chat completions endpoint override     |

use anyhow::{Context, Result};
use directories::ProjectDirs;
use providers::perplexity::PERPLEXITY_CHAT_URL;
use services::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};
use std::path::PathBuf;
use std::str::FromStr;

pub const DATA_DIR_ENV: &str = "RESEARCH_ASSISTANT_DATA_DIR";
pub const STORE_ENV: &str = "RESEARCH_ASSISTANT_STORE";
pub const API_URL_ENV: &str = "RESEARCH_ASSISTANT_API_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub store_backend: StoreBackend,
    pub api_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    fn resolve(env: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let dirs = ProjectDirs::from("com.local", "Research Assistant", "ResearchAssistant");
        let (default_data, default_config) = match &dirs {
            Some(d) => (d.data_dir().to_path_buf(), d.config_dir().to_path_buf()),
            None => (PathBuf::from("./data"), PathBuf::from("./data")),
        };

        let data_dir = var(DATA_DIR_ENV).map(PathBuf::from).unwrap_or(default_data);
        // An explicit data dir keeps secrets.json next to the data.
        let config_dir = if var(DATA_DIR_ENV).is_some() {
            data_dir.clone()
        } else {
            default_config
        };

        let store_backend = match var(STORE_ENV) {
            Some(raw) => raw.parse::<StoreBackend>().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "falling back to the json store");
                StoreBackend::Json
            }),
            None => StoreBackend::default(),
        };

        Self {
            data_dir,
            config_dir,
            store_backend,
            api_url: var(API_URL_ENV).unwrap_or_else(|| PERPLEXITY_CHAT_URL.to_string()),
        }
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.config_dir.join(crate::secrets::SECRETS_FILE)
    }

    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        let store: Box<dyn KeyValueStore> = match self.store_backend {
            StoreBackend::Json => Box::new(
                JsonFileStore::new(&self.data_dir)
                    .context("opening json conversation store")?,
            ),
            StoreBackend::Sqlite => Box::new(
                SqliteStore::new(&self.data_dir).context("opening sqlite conversation store")?,
            ),
            StoreBackend::Memory => Box::new(MemoryStore::new()),
        };
        tracing::info!(
            backend = store.backend_name(),
            dir = %self.data_dir.display(),
            "conversation store ready"
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn resolve(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::resolve(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&[]);
        assert_eq!(config.store_backend, StoreBackend::Json);
        assert_eq!(config.api_url, PERPLEXITY_CHAT_URL);
        assert!(config.secrets_path().ends_with("secrets.json"));
    }

    #[test]
    fn test_overrides() {
        let config = resolve(&[
            (DATA_DIR_ENV, "/tmp/ra-data"),
            (STORE_ENV, " SQLite "),
            (API_URL_ENV, "http://127.0.0.1:9/chat"),
        ]);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ra-data"));
        assert_eq!(config.config_dir, PathBuf::from("/tmp/ra-data"));
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.api_url, "http://127.0.0.1:9/chat");
    }

    #[test]
    fn test_unknown_backend_falls_back_to_json() {
        assert_eq!(resolve(&[(STORE_ENV, "redis")]).store_backend, StoreBackend::Json);
        assert_eq!(resolve(&[(STORE_ENV, "")]).store_backend, StoreBackend::Json);
    }

    #[test]
    fn test_open_store_for_each_backend() {
        let dir = TempDir::new().unwrap();
        for (name, backend) in [
            ("json", StoreBackend::Json),
            ("sqlite", StoreBackend::Sqlite),
            ("memory", StoreBackend::Memory),
        ] {
            let config = AppConfig {
                data_dir: dir.path().join(name),
                config_dir: dir.path().to_path_buf(),
                store_backend: backend,
                api_url: PERPLEXITY_CHAT_URL.to_string(),
            };
            let store = config.open_store().unwrap();
            assert_eq!(store.backend_name(), name);
            store.set_item("conversations", "[]").unwrap();
            assert_eq!(store.get_item("conversations").unwrap().as_deref(), Some("[]"));
        }
    }
}
