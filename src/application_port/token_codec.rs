use super::AuthError;
use crate::domain_model::SessionId;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Signs and reads session tokens.
///
/// Two trust levels are exposed on purpose: every claim accessor and
/// [`TokenCodec::is_structurally_valid`] verify the signature, while
/// [`TokenCodec::is_expired_by_wall_clock`] only decodes the payload segment.
pub trait TokenCodec: Send + Sync {
    /// Returns the token and its absolute expiry (`now + ttl`).
    fn issue(
        &self,
        subject: &str,
        session_id: &SessionId,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), AuthError>;

    /// Fails with [`AuthError::EmptyClaim`] when the subject is absent or blank.
    fn subject_of(&self, token: &str) -> Result<String, AuthError>;

    /// Fails with [`AuthError::EmptyClaim`] when the session id is absent or blank.
    fn session_id_of(&self, token: &str) -> Result<SessionId, AuthError>;

    fn expiry_of(&self, token: &str) -> Result<Option<DateTime<Utc>>, AuthError>;

    /// Embedded subject equals `subject` and expiry is strictly in the future.
    fn is_structurally_valid(&self, subject: &str, token: &str) -> bool;

    /// Payload-only decode, no signature check. `exp <= now` counts as expired.
    fn is_expired_by_wall_clock(&self, token: &str) -> Result<bool, AuthError>;
}

pub trait SessionIdGenerator: Send + Sync {
    fn generate(&self) -> SessionId;
}
