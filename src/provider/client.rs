use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::settings::ProviderConfig;
use crate::error::UpstreamError;
use crate::observability::metrics::get_metrics;
use crate::provider::types::{
    AccessToken, CodeExchangeResponse, ExtendTokenResponse, FeedItem, Identity, MediaPage,
};
use crate::utils::constants::{AUTHORIZATION_SCOPES, IDENTITY_FIELDS, MEDIA_FIELDS};

static HTTP_MSG: &str = "http";
static DECODE_MSG: &str = "decode";
static TRANSPORT_MSG: &str = "transport";

#[derive(Debug, Clone, Copy)]
pub enum ProviderCall {
    ExchangeCode,
    ExtendToken,
    LookupIdentity,
    ListMedia,
}

impl ProviderCall {
    pub fn as_label(&self) -> &'static str {
        match self {
            ProviderCall::ExchangeCode => "exchange_code",
            ProviderCall::ExtendToken => "extend_token",
            ProviderCall::LookupIdentity => "lookup_identity",
            ProviderCall::ListMedia => "list_media",
        }
    }
}

/// Client for the provider's OAuth and Graph endpoints.
///
/// Calls are single request/response exchanges: no retries, one fixed
/// timeout applied by the underlying client.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    config: ProviderConfig,
    authorize_url: Url,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build provider http client")?;
        let authorize_url = Url::parse(&config.authorize_url)
            .with_context(|| format!("invalid authorize url '{}'", config.authorize_url))?;
        Ok(Self {
            http,
            config: config.clone(),
            authorize_url,
        })
    }

    /// Where the end user is sent to grant access.
    pub fn authorization_url(&self) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", AUTHORIZATION_SCOPES);
        url
    }

    /// Trade an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, UpstreamError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];
        let request = self.http.post(&self.config.token_url).form(&form);
        let response: CodeExchangeResponse = self.send(ProviderCall::ExchangeCode, request).await?;
        debug!("code exchanged, provider user id: {:?}", response.user_id);
        Ok(AccessToken::new(response.access_token))
    }

    /// Trade the current token for a longer-lived one. Returns the new token
    /// and its lifetime in seconds when the provider states one.
    pub async fn extend_token(&self, token: &AccessToken) -> Result<(AccessToken, Option<u64>), UpstreamError> {
        let query = [
            ("grant_type", "ig_exchange_token"),
            ("client_secret", self.config.client_secret.as_str()),
            ("access_token", token.as_str()),
        ];
        let request = self.http.get(self.graph("access_token")).query(&query);
        let response: ExtendTokenResponse = self.send(ProviderCall::ExtendToken, request).await?;
        Ok((AccessToken::new(response.access_token), response.expires_in))
    }

    /// Ask the provider who the token belongs to.
    pub async fn lookup_identity(&self, token: &AccessToken) -> Result<Identity, UpstreamError> {
        let query = [("fields", IDENTITY_FIELDS), ("access_token", token.as_str())];
        let request = self.http.get(self.graph("me")).query(&query);
        let payload: Value = self.send(ProviderCall::LookupIdentity, request).await?;
        Ok(Identity::from_payload(payload))
    }

    /// Most recent media of the token owner. `None` when the response has no
    /// `data` collection.
    pub async fn list_media(&self, token: &AccessToken, limit: u32) -> Result<Option<Vec<FeedItem>>, UpstreamError> {
        let limit = limit.to_string();
        let query = [
            ("fields", MEDIA_FIELDS),
            ("access_token", token.as_str()),
            ("limit", limit.as_str()),
        ];
        let request = self.http.get(self.graph("me/media")).query(&query);
        let page: MediaPage = self.send(ProviderCall::ListMedia, request).await?;
        Ok(page.data)
    }

    fn graph(&self, path: &str) -> String {
        format!("{}/{}", self.config.graph_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, call: ProviderCall, request: RequestBuilder) -> Result<T, UpstreamError> {
        let metrics = get_metrics().await;
        let start = Instant::now();
        let label = call.as_label();
        metrics.provider_requests.with_label_values(&[label]).inc();

        let result = Self::exchange(request).await;

        metrics
            .provider_duration
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());
        if let Err((reason, err)) = &result {
            metrics.provider_failures.with_label_values(&[label, *reason]).inc();
            warn!(
                "provider call {} failed: {} (status: {:?}, body: {})",
                label,
                err.message,
                err.status,
                err.body.as_deref().unwrap_or("-")
            );
        }
        result.map_err(|(_, err)| err)
    }

    async fn exchange<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, (&'static str, UpstreamError)> {
        let response = request
            .send()
            .await
            .map_err(|e| (TRANSPORT_MSG, UpstreamError::transport(&e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| (TRANSPORT_MSG, UpstreamError::transport(&e)))?;

        if !status.is_success() {
            return Err((HTTP_MSG, UpstreamError::http(status.as_u16(), body)));
        }
        serde_json::from_str(&body).map_err(|e| (DECODE_MSG, UpstreamError::malformed(status.as_u16(), body, e)))
    }
}
