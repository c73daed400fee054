use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::{CONTENT_TYPE, LOCATION};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{BrokerError, UpstreamError};
use crate::provider::FeedItem;
use crate::server::server::AppState;
use crate::token::{AuthorizationOutcome, SessionInfo};
use crate::utils::constants::MSG_TOKEN_FROM_CACHE;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CachedTokenResponse {
    pub token: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub success: bool,
    pub data: Vec<FeedItem>,
}

/// `GET /auth`
pub async fn authorize(State(state): State<AppState>) -> Response {
    match state.tokens.ensure_authorized().await {
        Ok(AuthorizationOutcome::Cached(token)) => Json(CachedTokenResponse {
            token: token.into_inner(),
            message: MSG_TOKEN_FROM_CACHE,
        })
        .into_response(),
        Ok(AuthorizationOutcome::Redirect(url)) => found(url.as_str()),
        Err(e) => e.into_response(),
    }
}

/// `GET /auth/callback?code=`
pub async fn authorization_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let code = params.code.unwrap_or_default();
    match state.tokens.complete_authorization(&code).await {
        Ok(landing) => found(&landing),
        Err(e) => e.into_response(),
    }
}

/// `GET /validate-and-extend-token`
///
/// A provider failure is reported by its message only, without the body.
pub async fn extend_token(State(state): State<AppState>) -> Response {
    match state.tokens.extend_token().await {
        Ok(landing) => found(&landing),
        Err(BrokerError::Upstream(err)) => {
            error!("token extension failed: {}", err.payload());
            (upstream_status(&err), err.message).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// `GET /get-feeds`
pub async fn get_feeds(State(state): State<AppState>) -> Response {
    match state.feeds.get_feed().await {
        Ok(data) => Json(FeedResponse { success: true, data }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /session/status`
pub async fn session_status(State(state): State<AppState>) -> Response {
    match state.tokens.session_status().await {
        Ok(session) => session_response(session),
        Err(e) => e.into_response(),
    }
}

pub async fn health() -> &'static str {
    "ok"
}

fn session_response(session: SessionInfo) -> Response {
    let status = if session.is_valid() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(session)).into_response()
}

fn upstream_status(err: &UpstreamError) -> StatusCode {
    err.status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_owned())]).into_response()
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            BrokerError::MissingCode
            | BrokerError::NoToken
            | BrokerError::InvalidToken
            | BrokerError::MissingToken => (StatusCode::BAD_REQUEST, message).into_response(),
            BrokerError::Upstream(err) => {
                let status = upstream_status(&err);
                let body = err.payload().to_owned();
                let content_type = if serde_json::from_str::<serde_json::Value>(&body).is_ok() {
                    "application/json"
                } else {
                    "text/plain; charset=utf-8"
                };
                (status, [(CONTENT_TYPE, content_type)], body).into_response()
            }
            BrokerError::FeedFetch(err) => {
                error!("feed fetch failed: {}", err.payload());
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
            BrokerError::Cache(err) => {
                error!("cache failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
