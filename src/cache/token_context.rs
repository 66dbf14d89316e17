use reqwest::{Client, RequestBuilder};
use tracing::{debug, info};

use crate::cache::token::CachedToken;
use crate::config::credentials::ServiceConfig;
use crate::config::proc_validator::validate_service_config;
use crate::error::Result;
use crate::sources::exchange::TokenTransport;
use crate::sources::issuer::TokenIssuer;
use crate::sources::SubjectKind;

/// Credential state held by the caller for outbound API requests.
///
/// Tracks which subject type is active and the token last handed out for it.
/// Switching the subject type drops that token, so enterprise and user
/// requests never share one. Refresh is lazy: nothing happens until the next
/// [`CredentialContext::ensure_token`].
pub struct CredentialContext<T: TokenTransport = Client> {
    config: ServiceConfig,
    issuer: TokenIssuer<T>,
    active_subject_type: SubjectKind,
    current_token: Option<CachedToken>,
}

impl CredentialContext<Client> {
    /// Context using a reqwest issuer built from `config.settings`.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let issuer = TokenIssuer::from_settings(&config.settings)?;
        Self::new(config, issuer)
    }

    /// Attach a bearer token for the active subject to an API request.
    pub async fn authorize(&mut self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.ensure_token().await?;
        Ok(request.bearer_auth(token))
    }
}

impl<T: TokenTransport> CredentialContext<T> {
    /// Validates the configuration eagerly; the initial subject type comes
    /// from `settings.default_subject`.
    pub fn new(config: ServiceConfig, issuer: TokenIssuer<T>) -> Result<Self> {
        validate_service_config(&config)?;
        let active_subject_type = config.settings.default_subject;
        Ok(Self {
            config,
            issuer,
            active_subject_type,
            current_token: None,
        })
    }

    pub fn active_subject_type(&self) -> SubjectKind {
        self.active_subject_type
    }

    pub fn current_token(&self) -> Option<&str> {
        self.current_token.as_ref().map(|token| token.access_token.as_str())
    }

    pub fn issuer(&self) -> &TokenIssuer<T> {
        &self.issuer
    }

    pub fn set_subject_type(&mut self, kind: SubjectKind) {
        if kind == self.active_subject_type {
            return;
        }
        info!(from = %self.active_subject_type, to = %kind, "subject type switched");
        self.active_subject_type = kind;
        self.current_token = None;
    }

    /// Forget the held token, e.g. after the API answered 401.
    pub fn invalidate(&mut self) {
        self.current_token = None;
    }

    /// Token for the active subject, issued or loaded from cache when the
    /// held one is absent or expired.
    pub async fn ensure_token(&mut self) -> Result<String> {
        let now = self.issuer.now();
        if let Some(token) = self.current_token.as_ref().filter(|token| token.is_valid(now)) {
            return Ok(token.access_token.to_owned());
        }

        let kind = self.active_subject_type;
        let (subject, cache_location) = self.config.resolve_subject(kind)?;
        debug!(subject = %kind, cached = cache_location.is_some(), "obtaining access token");

        let token = self
            .issuer
            .issue(&self.config.identity, &subject, cache_location)
            .await?;
        let access_token = token.access_token.to_owned();
        self.current_token = Some(token);
        Ok(access_token)
    }
}
