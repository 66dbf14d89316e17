use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::settings::SettingsConfig;
use crate::error::{CredentialError, Result};
use crate::sources::{Subject, SubjectKind};


/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub identity: CredentialIdentity,
    pub enterprise: Option<SubjectConfig>,
    pub user: Option<SubjectConfig>,
    #[serde(default)]
    pub settings: SettingsConfig,
}

impl ServiceConfig {
    pub fn subject_config(&self, kind: SubjectKind) -> Option<&SubjectConfig> {
        match kind {
            SubjectKind::Enterprise => self.enterprise.as_ref(),
            SubjectKind::User => self.user.as_ref(),
        }
    }

    /// Resolve the subject of the requested kind together with its cache file.
    ///
    /// Fails when the identifier for that kind is not configured.
    pub fn resolve_subject(&self, kind: SubjectKind) -> Result<(Subject, Option<&Path>)> {
        let subject_config = self
            .subject_config(kind)
            .filter(|cfg| !cfg.id.trim().is_empty())
            .ok_or_else(|| {
                CredentialError::configuration(format!(
                    "'{}.id' must be set to get {} access token",
                    kind, kind
                ))
            })?;

        let subject = match kind {
            SubjectKind::Enterprise => Subject::enterprise(subject_config.id.to_owned()),
            SubjectKind::User => Subject::user(subject_config.id.to_owned()),
        };
        Ok((subject, subject_config.cache_path.as_deref()))
    }
}

/// ================================
/// Long-lived service identity
/// ================================
///
/// Missing keys deserialize as empty strings so validation can report
/// every absent field at once.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialIdentity {
    pub client_id: String,
    pub client_secret: String,
    /// `kid` header of every assertion
    pub public_key_id: String,
    pub private_key_path: PathBuf,
    pub key_passphrase: String,
}

impl CredentialIdentity {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        public_key_id: impl Into<String>,
        private_key_path: impl Into<PathBuf>,
        key_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            public_key_id: public_key_id.into(),
            private_key_path: private_key_path.into(),
            key_passphrase: key_passphrase.into(),
        }
    }

    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.trim().is_empty() {
            missing.push("client_id");
        }
        if self.client_secret.is_empty() {
            missing.push("client_secret");
        }
        if self.public_key_id.trim().is_empty() {
            missing.push("public_key_id");
        }
        if self.private_key_path.as_os_str().is_empty() {
            missing.push("private_key_path");
        }
        if self.key_passphrase.is_empty() {
            missing.push("key_passphrase");
        }
        missing
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        Err(CredentialError::configuration(format!(
            "required identity fields are not set: {}",
            missing.join(", ")
        )))
    }
}

// secret and passphrase must never reach the logs
impl fmt::Debug for CredentialIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialIdentity")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("public_key_id", &self.public_key_id)
            .field("private_key_path", &self.private_key_path)
            .field("key_passphrase", &"<redacted>")
            .finish()
    }
}

/// Enterprise or user block.
#[derive(Debug, Deserialize, Clone)]
pub struct SubjectConfig {
    pub id: String,
    /// Cache file for tokens of this subject. No caching when absent.
    pub cache_path: Option<PathBuf>,
}
