use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque provider credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Token endpoint answer to an authorization-code exchange.
#[derive(Debug, Deserialize)]
pub struct CodeExchangeResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_id: Option<Value>,
}

/// Graph answer to a long-lived token exchange.
#[derive(Debug, Deserialize)]
pub struct ExtendTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Result of `GET /me`.
#[derive(Debug, Clone)]
pub struct Identity {
    /// `id` from the payload; the provider sends it as a string but numbers
    /// are accepted too.
    pub subject_id: Option<String>,
    pub payload: Value,
}

impl Identity {
    pub fn from_payload(payload: Value) -> Self {
        let subject_id = match payload.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        Self { subject_id, payload }
    }
}

/// One media record of the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaPage {
    #[serde(default)]
    pub data: Option<Vec<FeedItem>>,
}
