#[cfg(test)]
mod tests {
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use http::StatusCode;
    use reqwest::Client;

    use crate::cache::token::CachedToken;
    use crate::cache::token_cache::TokenCache;
    use crate::cache::token_context::CredentialContext;
    use crate::error::CredentialError;
    use crate::tests::common::{json, service_config};

    const TOKEN_PATH: &str = "/oauth2/token";

    async fn prepare_token_mock(server: &MockServer, access_token: &str) {
        let access_token = access_token.to_owned();
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TOKEN_PATH)
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body_includes("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer")
                    .body_includes("client_id=client-id")
                    .body_includes("client_secret=client-secret")
                    .body_includes("assertion=");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({
                        "access_token": access_token,
                        "expires_in": 3600,
                        "restricted_to": [],
                        "token_type": "bearer"
                    }));
            })
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reqwest_exchange_issues_and_caches_token() {
        let server = MockServer::start_async().await;
        prepare_token_mock(&server, "xyz").await;

        let dir = tempfile::tempdir().expect("tempdir");
        let config = service_config(dir.path(), &server.url(TOKEN_PATH));
        let mut ctx = CredentialContext::from_config(config).expect("context");

        assert_eq!(ctx.ensure_token().await.unwrap(), "xyz");

        let cached = TokenCache::load(&dir.path().join("user.json")).await.expect("cached");
        assert_eq!(cached.access_token, "xyz");
        assert!(cached.is_valid(chrono::Utc::now().timestamp()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn authorize_attaches_bearer_token() {
        let server = MockServer::start_async().await;
        prepare_token_mock(&server, "xyz").await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/2.0/users/me")
                    .header("authorization", "Bearer xyz");
                then.status(200).json_body(json!({"type": "user", "id": "user-1"}));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let config = service_config(dir.path(), &server.url(TOKEN_PATH));
        let mut ctx = CredentialContext::from_config(config).expect("context");

        let request = ctx
            .authorize(Client::new().get(server.url("/2.0/users/me")))
            .await
            .unwrap();
        let response = request.send().await.unwrap();
        assert!(response.status().is_success(), "unexpected status: {}", response.status());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejected_assertion_keeps_previous_cache() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN_PATH);
                then.status(401)
                    .json_body(json!({"error": "invalid_client", "error_description": "The client credentials are invalid"}));
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let stale = CachedToken::new("stale".into(), 1);
        TokenCache::store(&dir.path().join("user.json"), &stale).await.unwrap();

        let config = service_config(dir.path(), &server.url(TOKEN_PATH));
        let mut ctx = CredentialContext::from_config(config).expect("context");

        let err = ctx.ensure_token().await.unwrap_err();
        match err {
            CredentialError::TokenExchange { status, reason, .. } => {
                assert_eq!(status, Some(StatusCode::UNAUTHORIZED));
                assert!(reason.contains("invalid_client"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(TokenCache::load(&dir.path().join("user.json")).await, Some(stale));
        assert_eq!(ctx.current_token(), None);
    }
}
