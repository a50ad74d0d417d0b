use super::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One issued access/refresh pair, keyed by its session id.
///
/// The refresh token embeds `session_id` as a claim. A stored record is the only
/// authority on whether its refresh token may still be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationCredential {
    pub session_id: SessionId,
    pub access_token: String,
    pub refresh_token: String,
    /// Informational only.
    pub owner_id: Option<String>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_json_uses_camel_case_keys() {
        let credential = AuthenticationCredential {
            session_id: SessionId::from("s1"),
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            owner_id: Some("u1".to_string()),
            access_expires_at: Utc::now(),
            refresh_expires_at: Utc::now(),
        };

        let value = serde_json::to_value(&credential).unwrap();

        // credential_compare_and_delete.lua reads this key
        assert_eq!(value["refreshToken"], "r");
        assert_eq!(value["sessionId"], "s1");
        assert!(value.get("refresh_token").is_none());
    }
}
