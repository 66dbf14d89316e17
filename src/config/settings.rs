use serde::Deserialize;

use crate::sources::SubjectKind;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, TOKEN_URL};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// OAuth2 token endpoint, also the `aud` claim of every assertion
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Subject type a fresh context starts with
    #[serde(default)]
    pub default_subject: SubjectKind,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    pub logging: Option<LoggingConfig>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            default_subject: SubjectKind::default(),
            http_timeout_ms: default_http_timeout_ms(),
            logging: None,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_token_url() -> String {
    TOKEN_URL.to_string()
}

fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}
