#[cfg(test)]
mod tests {
    use anyhow::Result;
    use axum::http::StatusCode;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use reqwest::header::LOCATION;
    use serde_json::{json, Value};

    use crate::cache::CacheEntry;
    use crate::observability::metrics::get_metrics;
    use crate::server::server::{router, AppState};
    use crate::tests::common::{
        broker_config, build_reqwest_client, cached, seed, spawn_axum, token_manager, ALLOWED_REFERER, APP_URL,
        SECRET_HEADER, SERVICE_SECRET,
    };
    use crate::token::TokenManager;
    use crate::utils::constants::{MSG_FORBIDDEN, MSG_TOKEN_FROM_CACHE};

    async fn serve(provider_base: &str, manager: TokenManager) -> (tokio::task::JoinHandle<()>, String) {
        let config = broker_config(provider_base);
        let state = AppState::new(get_metrics().await, manager);
        let app = router(&config, state).expect("router");
        let (handle, addr) = spawn_axum(app).await;
        (handle, format!("http://{}", addr))
    }

    #[tokio::test]
    async fn health_is_open() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;

        let response = build_reqwest_client().get(format!("{}/health", base)).send().await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await?, "ok");
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn auth_requires_allowed_referer() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;
        let client = build_reqwest_client();

        let missing = client.get(format!("{}/auth", base)).send().await?;
        let foreign = client
            .get(format!("{}/auth", base))
            .header("Referer", "https://evil.example/")
            .send()
            .await?;

        assert_eq!(missing.status(), StatusCode::FORBIDDEN);
        assert_eq!(foreign.status(), StatusCode::FORBIDDEN);
        assert_eq!(foreign.text().await?, MSG_FORBIDDEN);
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn auth_redirects_to_consent_when_nothing_cached() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;

        let response = build_reqwest_client()
            .get(format!("{}/auth", base))
            .header("Referer", ALLOWED_REFERER)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[LOCATION].to_str()?.to_owned();
        assert!(location.starts_with(&format!("{}/oauth/authorize/", server.base_url())));
        assert!(location.contains("client_id=test-client"));
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn auth_returns_cached_token_when_valid() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/me");
                then.status(200).json_body(json!({"id": "123", "username": "x"}));
            })
            .await;
        let manager = token_manager(&server.base_url());
        seed(manager.store(), CacheEntry::AccessToken, "tok").await;
        let (handle, base) = serve(&server.base_url(), manager).await;

        let response = build_reqwest_client()
            .get(format!("{}/auth", base))
            .header("Referer", ALLOWED_REFERER)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await?;
        assert_eq!(body, json!({"token": "tok", "message": MSG_TOKEN_FROM_CACHE}));
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn callback_stores_token_and_redirects_to_app() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/access_token");
                then.status(200).json_body(json!({"access_token": "T-1"}));
            })
            .await;
        let manager = token_manager(&server.base_url());
        let (handle, base) = serve(&server.base_url(), manager.clone()).await;

        let response = build_reqwest_client()
            .get(format!("{}/auth/callback?code=abc", base))
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], APP_URL);
        assert_eq!(cached(manager.store(), CacheEntry::AccessToken).await.as_deref(), Some("T-1"));
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn callback_without_code_is_plain_text() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;

        let response = build_reqwest_client()
            .get(format!("{}/auth/callback", base))
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.text().await?, "Authorization code is missing.");
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn callback_relays_provider_error_body() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/access_token");
                then.status(400)
                    .json_body(json!({"error_type": "OAuthException", "code": 400, "error_message": "Invalid code"}));
            })
            .await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;

        let response = build_reqwest_client()
            .get(format!("{}/auth/callback?code=bad", base))
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error_message"], "Invalid code");
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn extend_without_token_reports_missing() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;

        let response = build_reqwest_client()
            .get(format!("{}/validate-and-extend-token", base))
            .header("Referer", ALLOWED_REFERER)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.text().await?, "Access token is missing.");
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn failed_extension_reports_message_not_body() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/access_token");
                then.status(400)
                    .json_body(json!({"error": {"message": "Session has expired", "code": 190}}));
            })
            .await;
        let manager = token_manager(&server.base_url());
        seed(manager.store(), CacheEntry::AccessToken, "stale").await;
        let (handle, base) = serve(&server.base_url(), manager.clone()).await;

        let response = build_reqwest_client()
            .get(format!("{}/validate-and-extend-token", base))
            .header("Referer", ALLOWED_REFERER)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let text = response.text().await?;
        assert_eq!(text, "provider responded with status 400");
        assert_eq!(cached(manager.store(), CacheEntry::AccessToken).await.as_deref(), Some("stale"));
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn feeds_require_shared_secret() -> Result<()> {
        let server = MockServer::start_async().await;
        let manager = token_manager(&server.base_url());
        seed(manager.store(), CacheEntry::FeedItems, r#"[{"id":"1","media_type":"IMAGE"}]"#).await;
        let (handle, base) = serve(&server.base_url(), manager).await;
        let client = build_reqwest_client();

        let denied = client
            .get(format!("{}/get-feeds", base))
            .header(SECRET_HEADER, "guess")
            .send()
            .await?;
        let allowed = client
            .get(format!("{}/get-feeds", base))
            .header(SECRET_HEADER, SERVICE_SECRET)
            .send()
            .await?;

        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(denied.text().await?, MSG_FORBIDDEN);
        assert_eq!(allowed.status(), StatusCode::OK);
        let body: Value = allowed.json().await?;
        assert_eq!(body, json!({"success": true, "data": [{"id": "1", "media_type": "IMAGE"}]}));
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn feeds_with_invalid_token_are_bad_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;

        let response = build_reqwest_client()
            .get(format!("{}/get-feeds", base))
            .header(SECRET_HEADER, SERVICE_SECRET)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.text().await?, "Token invalid.");
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn session_status_failure_is_server_error_with_payload() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;

        let response = build_reqwest_client()
            .get(format!("{}/session/status", base))
            .header(SECRET_HEADER, SERVICE_SECRET)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], true);
        assert!(body.get("userId").is_none());
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn session_status_returns_user() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/me");
                then.status(200).json_body(json!({"id": "123", "username": "x"}));
            })
            .await;
        let manager = token_manager(&server.base_url());
        seed(manager.store(), CacheEntry::AccessToken, "tok").await;
        let (handle, base) = serve(&server.base_url(), manager).await;

        let response = build_reqwest_client()
            .get(format!("{}/session/status", base))
            .header(SECRET_HEADER, SERVICE_SECRET)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], false);
        assert_eq!(body["userId"], "123");
        handle.abort();
        Ok(())
    }

    #[tokio::test]
    async fn metrics_are_exposed() -> Result<()> {
        let server = MockServer::start_async().await;
        let (handle, base) = serve(&server.base_url(), token_manager(&server.base_url())).await;
        let client = build_reqwest_client();

        // one rejection so a labelled series exists
        client.get(format!("{}/auth", base)).send().await?;
        let response = client.get(format!("{}/metrics", base)).send().await?;

        assert_eq!(response.status(), StatusCode::OK);
        let text = response.text().await?;
        assert!(text.contains("igbroker_gate_rejections_total"));
        handle.abort();
        Ok(())
    }
}
