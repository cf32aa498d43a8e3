use crate::error::{AppError, AppResult};
use crate::infrastructure::storage::{self, KeyValueStore};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub v1_base_url: String,
    pub v2_base_url: String,
    /// API key from the environment; the stored credential is the fallback
    pub api_key: Option<String>,
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let v1_base_url = env::var("ADDIS_V1_BASE_URL")
            .map(trim_base_url)
            .unwrap_or_default();
        // The synthesis contract is shared, so a v1-only setup may leave the
        // v2 base unset
        let v2_base_url = env::var("ADDIS_V2_BASE_URL")
            .map(trim_base_url)
            .unwrap_or_else(|_| v1_base_url.clone());

        let config = Config {
            v1_base_url,
            v2_base_url,
            api_key: env::var("ADDIS_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            data_dir: env::var("ADDIS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
            log_format: env::var("LOG_FORMAT")
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })
                .unwrap_or(LogFormat::Pretty),
        };

        Ok(config)
    }

    /// Base URLs for the two backends, validated at the point a backend is
    /// actually built; commands that never touch the network skip this.
    pub fn backend_base_urls(&self) -> AppResult<(String, String)> {
        if self.v1_base_url.is_empty() {
            return Err(AppError::Config(
                "ADDIS_V1_BASE_URL is not set".to_string(),
            ));
        }
        let v2 = if self.v2_base_url.is_empty() {
            self.v1_base_url.clone()
        } else {
            self.v2_base_url.clone()
        };
        Ok((self.v1_base_url.clone(), v2))
    }

    /// Resolve the API key used for backend calls: environment first, then
    /// the stored credential.
    pub fn resolve_api_key(&self, store: &dyn KeyValueStore) -> AppResult<Option<String>> {
        if self.api_key.is_some() {
            return Ok(self.api_key.clone());
        }
        storage::stored_api_key(store)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("addis-speech")
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
