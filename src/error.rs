//! Error taxonomy of the token engine.
//!
//! Cache reads never produce an error; a broken cache file is a cache miss.

use std::path::PathBuf;

use http::StatusCode;

use crate::sources::SubjectKind;

pub type Result<T> = std::result::Result<T, CredentialError>;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Missing or invalid identity/subject configuration. Not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The private key cannot be loaded, decrypted or used for signing.
    #[error("cannot sign assertion with key '{}': {reason}", .key_path.display())]
    KeySignature { key_path: PathBuf, reason: String },

    /// The token endpoint rejected the assertion or answered with garbage.
    #[error("token exchange for {subject} subject failed ({}): {reason}", status_label(.status))]
    TokenExchange {
        subject: SubjectKind,
        status: Option<StatusCode>,
        reason: String,
    },

    /// The freshly issued token could not be written to its cache file.
    #[error("cannot store {subject} token at '{}': {source}", .path.display())]
    Storage {
        subject: SubjectKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CredentialError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Only a failed exchange may succeed on a later attempt without fixing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TokenExchange { .. })
    }
}

fn status_label(status: &Option<StatusCode>) -> String {
    match status {
        Some(status) => format!("status {}", status),
        None => "no response".to_owned(),
    }
}
