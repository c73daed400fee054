//! Checks applied before a request reaches the token manager.
//!
//! One gate is attached per route when the router is built. A rejected
//! request always gets the same 403, whichever check failed.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{HOST, REFERER};
use http::{HeaderMap, HeaderName, StatusCode};
use tracing::debug;

use crate::config::settings::{GateConfig, ProtectedGate};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::MSG_FORBIDDEN;

#[derive(Debug, Clone)]
pub enum RequestGate {
    /// `Referer` must equal one of the entries, byte for byte.
    OriginAllowList(Arc<Vec<String>>),
    /// `Host` must equal one of the entries, byte for byte.
    HostAllowList(Arc<Vec<String>>),
    /// The named header must carry the shared secret.
    SharedSecretHeader { header: HeaderName, secret: Arc<String> },
}

impl RequestGate {
    pub fn origin_allow_list(config: &GateConfig) -> Self {
        RequestGate::OriginAllowList(Arc::new(config.allowed_origins.clone()))
    }

    pub fn host_allow_list(config: &GateConfig) -> Self {
        RequestGate::HostAllowList(Arc::new(config.allowed_hosts.clone()))
    }

    pub fn shared_secret(config: &GateConfig) -> Result<Self> {
        let header = HeaderName::from_bytes(config.service_secret_header.as_bytes())
            .with_context(|| format!("invalid secret header name '{}'", config.service_secret_header))?;
        Ok(RequestGate::SharedSecretHeader {
            header,
            secret: Arc::new(config.service_secret.clone()),
        })
    }

    /// Gate for the service-to-service routes, as configured.
    pub fn protected_routes(config: &GateConfig) -> Result<Self> {
        match config.protected_gate {
            ProtectedGate::SharedSecret => Self::shared_secret(config),
            ProtectedGate::Host => Ok(Self::host_allow_list(config)),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            RequestGate::OriginAllowList(_) => "origin",
            RequestGate::HostAllowList(_) => "host",
            RequestGate::SharedSecretHeader { .. } => "shared_secret",
        }
    }

    pub fn admits(&self, headers: &HeaderMap) -> bool {
        match self {
            RequestGate::OriginAllowList(allowed) => header_in(headers, &REFERER, allowed),
            RequestGate::HostAllowList(allowed) => header_in(headers, &HOST, allowed),
            RequestGate::SharedSecretHeader { header, secret } => headers
                .get(header)
                .is_some_and(|value| constant_time_eq(value.as_bytes(), secret.as_bytes())),
        }
    }
}

fn header_in(headers: &HeaderMap, name: &HeaderName, allowed: &[String]) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|value| allowed.iter().any(|a| a == value))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware entry point, used with `axum::middleware::from_fn_with_state`.
pub async fn enforce(State(gate): State<RequestGate>, request: Request, next: Next) -> Response {
    if gate.admits(request.headers()) {
        return next.run(request).await;
    }
    debug!("{} gate rejected {}", gate.as_label(), request.uri().path());
    get_metrics()
        .await
        .gate_rejections
        .with_label_values(&[gate.as_label()])
        .inc();
    (StatusCode::FORBIDDEN, MSG_FORBIDDEN).into_response()
}
