use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::KcatError;

pub const DEFAULT_CONFIG_FILE: &str = "kcat-hub.json";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_MODEL_A_URL: &str = "http://localhost:3501";
pub const DEFAULT_MODEL_B_URL: &str = "http://localhost:3502";
pub const DEFAULT_LOOKUP_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub model_a_url: Option<String>,
    #[serde(default)]
    pub model_b_url: Option<String>,
    #[serde(default)]
    pub lookup_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub auth_redirect_delay_ms: Option<u64>,
    #[serde(default)]
    pub session_path: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend_url: String,
    pub model_a_url: String,
    pub model_b_url: String,
    pub lookup_url: String,
    pub request_timeout: Duration,
    pub auth_redirect_delay: Duration,
    pub session_path: Option<Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; the default file is optional.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KcatError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KcatError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KcatError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KcatError> {
        Ok(ResolvedConfig {
            backend_url: service_url(config.backend_url, DEFAULT_BACKEND_URL)?,
            model_a_url: service_url(config.model_a_url, DEFAULT_MODEL_A_URL)?,
            model_b_url: service_url(config.model_b_url, DEFAULT_MODEL_B_URL)?,
            lookup_url: service_url(config.lookup_url, DEFAULT_LOOKUP_URL)?,
            request_timeout: Duration::from_secs(config.request_timeout_secs.unwrap_or(30)),
            auth_redirect_delay: Duration::from_millis(
                config.auth_redirect_delay_ms.unwrap_or(2000),
            ),
            session_path: config.session_path.or_else(default_session_path),
        })
    }
}

fn service_url(value: Option<String>, default: &str) -> Result<String, KcatError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|err| KcatError::ConfigParse(format!("{trimmed}: {err}")))?;
    Ok(trimmed.to_string())
}

pub fn default_session_path() -> Option<Utf8PathBuf> {
    BaseDirs::new().and_then(|dirs| {
        Utf8PathBuf::from_path_buf(
            dirs.home_dir()
                .join(".config")
                .join("kcat-hub")
                .join("session.json"),
        )
        .ok()
    })
}
