use std::path::Path;
use crate::config::credentials::ServiceConfig;
use crate::config::proc_validator;
use crate::config::settings::{LogFormat, LoggingConfig};
use crate::error::{CredentialError, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, error};

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CredentialError::configuration(format!("cannot read config '{}': {}", path.display(), e))
    })?;

    let expanded = expand_env_vars(&content);
    parse_config(&expanded)
}

/// Parse YAML content, apply defaults and validate eagerly.
pub fn parse_config(content: &str) -> Result<ServiceConfig> {
    let mut service_config: ServiceConfig = serde_yaml::from_str(content)
        .map_err(|e| {
            error!("parse config error: {}", e);
            CredentialError::configuration(format!("invalid config format: {}", e))
        })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::Compact));
    }
    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)?;

    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with environment values.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| {
        Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("env var pattern is valid")
    });
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}
