use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::Identity;
use crate::utils::constants::{MSG_NO_SESSION, MSG_SESSION_EXPIRED, MSG_TOKEN_VALID};

/// Outcome of checking the cached token against the provider.
///
/// Serialized as `{error, message, userId?, response?}` for the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl SessionInfo {
    pub fn valid(user_id: String, payload: Value) -> Self {
        Self {
            error: false,
            message: MSG_TOKEN_VALID.to_owned(),
            user_id: Some(user_id),
            response: Some(payload),
        }
    }

    /// No token, or the provider could not be asked.
    pub fn no_session() -> Self {
        Self::failure(MSG_NO_SESSION)
    }

    /// The provider answered but did not name a user.
    pub fn expired() -> Self {
        Self::failure(MSG_SESSION_EXPIRED)
    }

    fn failure(message: &str) -> Self {
        Self {
            error: true,
            message: message.to_owned(),
            user_id: None,
            response: None,
        }
    }

    pub fn from_identity(identity: Identity) -> Self {
        match identity.subject_id {
            Some(user_id) => Self::valid(user_id, identity.payload),
            None => Self::expired(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_session_serializes_camel_case() {
        let session = SessionInfo::valid("123".into(), json!({"id": "123", "username": "x"}));
        let value = serde_json::to_value(&session).unwrap();

        assert_eq!(value["error"], false);
        assert_eq!(value["userId"], "123");
        assert_eq!(value["response"]["username"], "x");
    }

    #[test]
    fn failed_session_has_no_user_fields() {
        let value = serde_json::to_value(SessionInfo::no_session()).unwrap();
        assert_eq!(value, json!({"error": true, "message": MSG_NO_SESSION}));
    }

    #[test]
    fn identity_without_subject_is_expired() {
        let identity = Identity::from_payload(json!({"username": "x"}));
        assert_eq!(SessionInfo::from_identity(identity), SessionInfo::expired());
    }
}
