use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info};

use crate::cache::token::CachedToken;
use crate::cache::token_cache::TokenCache;
use crate::config::credentials::CredentialIdentity;
use crate::config::settings::SettingsConfig;
use crate::error::{CredentialError, Result};
use crate::helpers::time::{format_unix_ts, now_i64, Clock};
use crate::observability::metrics::{get_metrics, OUTCOME_CACHE_HIT, OUTCOME_ISSUED};
use crate::sources::assertion::AssertionBuilder;
use crate::sources::exchange::{exchange_assertion, TokenTransport};
use crate::sources::Subject;

/// Produces access tokens, consulting the file cache before the endpoint.
pub struct TokenIssuer<T: TokenTransport = Client> {
    transport: T,
    token_url: String,
    assertion_builder: AssertionBuilder,
    clock: Clock,
    // serializes load-miss -> exchange -> store per cache file
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl TokenIssuer<Client> {
    /// Issuer talking to `settings.token_url` through a reqwest client.
    pub fn from_settings(settings: &SettingsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.http_timeout_ms))
            .build()
            .map_err(|e| CredentialError::configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self::new(client, settings.token_url.to_owned()))
    }
}

impl<T: TokenTransport> TokenIssuer<T> {
    pub fn new(transport: T, token_url: impl Into<String>) -> Self {
        let token_url = token_url.into();
        Self {
            transport,
            assertion_builder: AssertionBuilder::new(token_url.to_owned()),
            token_url,
            clock: now_i64,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> i64 {
        (self.clock)()
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Access token for `subject`, reusing the one cached at `cache_location`
    /// while it is still valid.
    pub async fn get_access_token(
        &self,
        identity: &CredentialIdentity,
        subject: &Subject,
        cache_location: Option<&Path>,
    ) -> Result<String> {
        self.issue(identity, subject, cache_location)
            .await
            .map(|token| token.access_token)
    }

    /// Same as [`TokenIssuer::get_access_token`] but keeps the expiry.
    pub async fn issue(
        &self,
        identity: &CredentialIdentity,
        subject: &Subject,
        cache_location: Option<&Path>,
    ) -> Result<CachedToken> {
        let Some(location) = cache_location else {
            return self.exchange(identity, subject).await;
        };

        let lock = self.location_lock(location);
        let _guard = lock.lock().await;

        if let Some(cached) = TokenCache::load(location).await {
            if cached.is_valid(self.now()) {
                debug!(subject = %subject.kind(), path = %location.display(), "cached token is valid");
                get_metrics()
                    .await
                    .token_requests
                    .with_label_values(&[subject.kind().as_str(), OUTCOME_CACHE_HIT])
                    .inc();
                return Ok(cached);
            }
            debug!(subject = %subject.kind(), path = %location.display(), expired_at = %format_unix_ts(cached.expires_at), "cached token expired");
        }

        let token = self.exchange(identity, subject).await?;

        if let Err(source) = TokenCache::store(location, &token).await {
            error!(subject = %subject.kind(), path = %location.display(), error = %source, "cannot cache token");
            get_metrics()
                .await
                .cache_store_failures
                .with_label_values(&[subject.kind().as_str()])
                .inc();
            return Err(CredentialError::Storage {
                subject: subject.kind(),
                path: location.to_owned(),
                source,
            });
        }

        Ok(token)
    }

    async fn exchange(&self, identity: &CredentialIdentity, subject: &Subject) -> Result<CachedToken> {
        let kind = subject.kind();
        let metrics = get_metrics().await;

        let assertion = self
            .assertion_builder
            .build(identity, subject, self.now())
            .inspect_err(|e| {
                error!(subject = %kind, error = %e, "cannot build assertion");
            })?;

        let start = Instant::now();
        let response = exchange_assertion(&self.transport, &self.token_url, identity, &assertion, kind).await;
        metrics
            .token_exchange_duration
            .with_label_values(&[kind.as_str()])
            .observe(start.elapsed().as_secs_f64());

        let response = response.inspect_err(|e| {
            error!(subject = %kind, error = %e, "token exchange failed");
            metrics
                .token_exchange_failures
                .with_label_values(&[kind.as_str(), failure_reason(e)])
                .inc();
        })?;

        let token = CachedToken::issued_at(response.access_token, self.now(), response.expires_in);
        info!(subject = %kind, expires_at = %format_unix_ts(token.expires_at), "access token issued");
        metrics
            .token_requests
            .with_label_values(&[kind.as_str(), OUTCOME_ISSUED])
            .inc();
        metrics
            .token_expiry_unix
            .with_label_values(&[kind.as_str()])
            .set(token.expires_at);

        Ok(token)
    }

    fn location_lock(&self, location: &Path) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(location.to_path_buf())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

fn failure_reason(err: &CredentialError) -> &'static str {
    match err {
        CredentialError::TokenExchange { status: None, .. } => "transport",
        CredentialError::TokenExchange { status: Some(status), .. } if !status.is_success() => "status",
        _ => "response",
    }
}
