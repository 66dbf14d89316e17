use std::future::Future;

use anyhow::Result;
use http::StatusCode;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::credentials::CredentialIdentity;
use crate::error::CredentialError;
use crate::sources::SubjectKind;
use crate::utils::constants::JWT_BEARER_GRANT_TYPE;

/// Raw answer of the token endpoint.
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Unauthenticated form POST used for the assertion exchange.
///
/// Retries and timeouts belong to the implementation, not to the issuer.
pub trait TokenTransport: Send + Sync {
    fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> impl Future<Output = Result<ExchangeResponse>> + Send;
}

impl TokenTransport for Client {
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<ExchangeResponse> {
        let response = self.post(url).form(fields).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(ExchangeResponse { status, body })
    }
}

/// Successful token endpoint payload; other members are ignored.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// Trade a signed assertion for an access token.
pub async fn exchange_assertion<T: TokenTransport>(
    transport: &T,
    token_url: &str,
    identity: &CredentialIdentity,
    assertion: &str,
    subject: SubjectKind,
) -> Result<TokenResponse, CredentialError> {
    let fields = [
        ("grant_type", JWT_BEARER_GRANT_TYPE),
        ("assertion", assertion),
        ("client_id", identity.client_id.as_str()),
        ("client_secret", identity.client_secret.as_str()),
    ];

    let response = transport
        .post_form(token_url, &fields)
        .await
        .map_err(|e| CredentialError::TokenExchange {
            subject,
            status: None,
            reason: format!("request to '{}' failed: {:#}", token_url, e),
        })?;

    if !response.status.is_success() {
        warn!(subject = %subject, status = %response.status, "token endpoint rejected assertion");
        return Err(CredentialError::TokenExchange {
            subject,
            status: Some(response.status),
            reason: error_reason(&response.body),
        });
    }

    let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
        CredentialError::TokenExchange {
            subject,
            status: Some(response.status),
            reason: format!("unparseable token response: {}", e),
        }
    })?;

    if token.access_token.is_empty() {
        return Err(CredentialError::TokenExchange {
            subject,
            status: Some(response.status),
            reason: "token response has an empty access_token".to_owned(),
        });
    }
    if token.expires_in <= 0 {
        return Err(CredentialError::TokenExchange {
            subject,
            status: Some(response.status),
            reason: format!("token response has a non-positive expires_in ({})", token.expires_in),
        });
    }

    debug!(subject = %subject, expires_in = token.expires_in, "assertion exchanged");
    Ok(token)
}

/// OAuth2 error responses carry `error` and `error_description`.
fn error_reason(body: &str) -> String {
    #[derive(Deserialize)]
    struct OAuthError {
        error: String,
        error_description: Option<String>,
    }

    match serde_json::from_str::<OAuthError>(body) {
        Ok(OAuthError { error, error_description: Some(description) }) => {
            format!("{}: {}", error, description)
        }
        Ok(OAuthError { error, error_description: None }) => error,
        Err(_) => {
            let mut snippet: String = body.chars().take(200).collect();
            if snippet.is_empty() {
                snippet.push_str("empty response body");
            }
            snippet
        }
    }
}
