use thiserror::Error;

use crate::cache::CacheError;

/// A failed provider call.
///
/// `body` keeps the provider's raw response when one was received so it can
/// be handed back to the caller untouched.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub body: Option<String>,
    pub message: String,
}

impl UpstreamError {
    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            body: None,
            message: err.to_string(),
        }
    }

    pub fn http(status: u16, body: String) -> Self {
        Self {
            status: Some(status),
            body: Some(body).filter(|b| !b.is_empty()),
            message: format!("provider responded with status {}", status),
        }
    }

    pub fn malformed(status: u16, body: String, reason: impl std::fmt::Display) -> Self {
        Self {
            status: Some(status),
            body: Some(body).filter(|b| !b.is_empty()),
            message: format!("unexpected provider response: {}", reason),
        }
    }

    /// What the caller gets to see: the provider body if any, else the message.
    pub fn payload(&self) -> &str {
        self.body.as_deref().unwrap_or(&self.message)
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Authorization code is missing.")]
    MissingCode,
    #[error("Access token is missing.")]
    NoToken,
    #[error("Token invalid.")]
    InvalidToken,
    #[error("Access token is missing or expired.")]
    MissingToken,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Error retrieving feeds.")]
    FeedFetch(#[source] UpstreamError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub type BrokerResult<T> = Result<T, BrokerError>;
