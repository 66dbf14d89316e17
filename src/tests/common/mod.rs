// tests/common/mod.rs
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use http::StatusCode;
pub use serde_json::json;

use crate::config::credentials::{CredentialIdentity, ServiceConfig, SubjectConfig};
use crate::config::settings::SettingsConfig;
use crate::sources::exchange::{ExchangeResponse, TokenTransport};

pub const PUBLIC_KEY_PEM: &str = include_str!("../../../fixtures/public_key.pem");
pub const KEY_PASSPHRASE: &str = "test-passphrase";
pub const TOKEN_URL: &str = "https://api.box.com/oauth2/token";

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

pub fn fixture_identity() -> CredentialIdentity {
    CredentialIdentity::new(
        "client-id",
        "client-secret",
        "kid-1",
        fixture_path("private_key.pem"),
        KEY_PASSPHRASE,
    )
}

/// Config with both subjects cached under `cache_dir`.
pub fn service_config(cache_dir: &Path, token_url: &str) -> ServiceConfig {
    ServiceConfig {
        identity: fixture_identity(),
        enterprise: Some(SubjectConfig {
            id: "ent-1".to_owned(),
            cache_path: Some(cache_dir.join("enterprise.json")),
        }),
        user: Some(SubjectConfig {
            id: "user-1".to_owned(),
            cache_path: Some(cache_dir.join("user.json")),
        }),
        settings: SettingsConfig {
            token_url: token_url.to_owned(),
            ..SettingsConfig::default()
        },
    }
}

pub fn token_body(access_token: &str, expires_in: i64) -> String {
    json!({
        "access_token": access_token,
        "expires_in": expires_in,
        "token_type": "bearer",
        "restricted_to": [],
    })
    .to_string()
}

/// In-process token endpoint answering with queued responses.
///
/// Once the queue is drained every call fails with 500.
#[derive(Default)]
pub struct StubTransport {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<ExchangeResponse>>,
    requests: Mutex<Vec<Vec<(String, String)>>>,
    delay: Option<Duration>,
    unreachable: bool,
}

impl StubTransport {
    /// One successful response per token, each valid for `expires_in` seconds.
    pub fn issuing(tokens: &[&str], expires_in: i64) -> Self {
        let responses = tokens
            .iter()
            .map(|token| ExchangeResponse {
                status: StatusCode::OK,
                body: token_body(token, expires_in),
            })
            .collect();
        Self {
            responses: Mutex::new(responses),
            ..Self::default()
        }
    }

    pub fn responding(status: StatusCode, body: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([ExchangeResponse {
                status,
                body: body.to_owned(),
            }])),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Form fields of every request received so far.
    pub fn requests(&self) -> Vec<Vec<(String, String)>> {
        self.requests.lock().unwrap().clone()
    }
}

impl TokenTransport for StubTransport {
    async fn post_form(&self, _url: &str, fields: &[(&str, &str)]) -> Result<ExchangeResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable {
            return Err(anyhow!("connection refused"));
        }
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or(ExchangeResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        }))
    }
}

pub fn field<'a>(request: &'a [(String, String)], name: &str) -> Option<&'a str> {
    request
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}
