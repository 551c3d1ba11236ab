//! Environment-driven configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::geo::nominatim::DEFAULT_BASE_URL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub geocoder_base_url: String,
    pub geocoder_timeout: Duration,
    pub user_agent: String,
    pub share_webhook_url: Option<String>,
    pub share_max_bytes: usize,
    pub report_output_dir: Option<PathBuf>,
    pub session_ttl: Duration,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            geocoder_base_url: DEFAULT_BASE_URL.to_string(),
            geocoder_timeout: Duration::from_secs(10),
            user_agent: concat!("obra-report-server/", env!("CARGO_PKG_VERSION")).to_string(),
            share_webhook_url: None,
            share_max_bytes: 10 * 1024 * 1024,
            report_output_dir: None,
            session_ttl: Duration::from_secs(60 * 60),
            max_upload_bytes: 15 * 1024 * 1024,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Load from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let allowed_origins = match non_empty(lookup("ALLOWED_ORIGINS")) {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.allowed_origins,
        };

        Ok(Self {
            host: non_empty(lookup("HOST")).unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            geocoder_base_url: non_empty(lookup("GEOCODER_BASE_URL"))
                .unwrap_or(defaults.geocoder_base_url),
            geocoder_timeout: Duration::from_secs(parse_var(
                &lookup,
                "GEOCODER_TIMEOUT_SECS",
                defaults.geocoder_timeout.as_secs(),
            )?),
            user_agent: non_empty(lookup("HTTP_USER_AGENT")).unwrap_or(defaults.user_agent),
            share_webhook_url: non_empty(lookup("SHARE_WEBHOOK_URL")),
            share_max_bytes: parse_var(&lookup, "SHARE_MAX_BYTES", defaults.share_max_bytes)?,
            report_output_dir: non_empty(lookup("REPORT_OUTPUT_DIR")).map(PathBuf::from),
            session_ttl: Duration::from_secs(parse_var(
                &lookup,
                "SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )?),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            allowed_origins,
        })
    }
}
