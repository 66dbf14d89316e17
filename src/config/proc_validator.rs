//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Identity fields are required; subject blocks are checked only when present

use tracing::{error, info};

use crate::config::credentials::{ServiceConfig, SubjectConfig};
use crate::config::settings::SettingsConfig;
use crate::error::{CredentialError, Result};

pub fn validate_service_config(cfg: &ServiceConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    for field in cfg.identity.missing_fields() {
        errors.push(format!("identity.{} is required", field));
    }

    if let Some(enterprise) = &cfg.enterprise {
        validate_subject("enterprise", enterprise, &mut errors);
    }
    if let Some(user) = &cfg.user {
        validate_subject("user", user, &mut errors);
    }

    // both subjects must never share a cache file
    if let (Some(enterprise), Some(user)) = (
        cfg.enterprise.as_ref().and_then(|e| e.cache_path.as_ref()),
        cfg.user.as_ref().and_then(|u| u.cache_path.as_ref()),
    ) {
        if enterprise == user {
            errors.push(format!(
                "enterprise.cache_path and user.cache_path both point to '{}'",
                enterprise.display()
            ));
        }
    }

    validate_settings(&cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(CredentialError::configuration(format!(
            "config is not valid, total errors: {}: {}",
            errors.len(),
            errors.join("; ")
        )))
    }
}

fn validate_subject(name: &str, subject: &SubjectConfig, errors: &mut Vec<String>) {
    if subject.id.trim().is_empty() {
        errors.push(format!("{}.id must not be empty", name));
    }
    if let Some(path) = &subject.cache_path {
        if path.as_os_str().is_empty() {
            errors.push(format!("{}.cache_path must not be empty when set", name));
        } else if path.file_name().is_none() {
            errors.push(format!("{}.cache_path '{}' must point to a file", name, path.display()));
        }
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if !(settings.token_url.starts_with("https://") || settings.token_url.starts_with("http://")) {
        errors.push(format!(
            "settings.token_url '{}' must be an http(s) URL",
            settings.token_url
        ));
    }

    if settings.http_timeout_ms == 0 {
        errors.push("settings.http_timeout_ms must be > 0".to_string());
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}
