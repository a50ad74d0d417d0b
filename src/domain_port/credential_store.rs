use crate::domain_model::*;

/// Persistence for issued credential pairs, keyed by session id.
///
/// Implemented by a durable backend (records live until deleted) and an
/// ephemeral backend (records expire after a TTL reset on every save). Apart
/// from autonomous expiry the two must be observably identical.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Upsert by `session_id`.
    async fn save(
        &self,
        credential: AuthenticationCredential,
    ) -> Result<AuthenticationCredential, CredentialStoreError>;

    async fn find_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<AuthenticationCredential>, CredentialStoreError>;

    /// No error when the record is absent.
    async fn delete_by_session_id(&self, session_id: &SessionId)
    -> Result<(), CredentialStoreError>;

    /// Delete the record only if it still holds `refresh_token`. Returns whether
    /// a record was deleted. Must be atomic with respect to concurrent callers.
    async fn delete_if_refresh_token_matches(
        &self,
        session_id: &SessionId,
        refresh_token: &str,
    ) -> Result<bool, CredentialStoreError>;

    /// Maintenance and test use only.
    async fn delete_all(&self) -> Result<(), CredentialStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("store error: {0}")]
    Store(String),
    #[error("record encoding error: {0}")]
    Encoding(String),
}
