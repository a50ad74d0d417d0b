use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid subject or secret")]
    BadCredentials,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("required token claim is missing or blank")]
    EmptyClaim,
    #[error("token is malformed")]
    MalformedToken,
    #[error("access token carries no expiry")]
    InvalidAccessToken,
    #[error("principal not found")]
    PrincipalNotFound,
    #[error("no credential stored for this session")]
    CredentialNotFound,
    #[error("refresh token does not match the stored credential")]
    TokenMismatch,
    #[error("refresh token is invalid or expired")]
    InvalidRefreshToken,
    #[error("refresh requested before the access token expired")]
    InvalidTokenReissueRequest,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<crate::domain_port::CredentialStoreError> for AuthError {
    fn from(error: crate::domain_port::CredentialStoreError) -> Self {
        AuthError::Store(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LogInInput {
    pub subject: String,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;

    /// Well-formed hash that no secret matches. Verified in place of a real one
    /// when the subject is unknown, so both failures cost the same.
    fn decoy_hash(&self) -> &str;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn log_in(&self, request: LogInInput) -> Result<AuthTokens, AuthError>;
    async fn refresh(&self, presented_refresh_token: &str) -> Result<AuthTokens, AuthError>;
}
