use super::bearer_token;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

/// Logout: drops the stored pair for the presented token's session.
pub struct RevocationHandler {
    token_codec: Arc<dyn TokenCodec>,
    credential_store: Arc<dyn CredentialStore>,
}

impl RevocationHandler {
    pub fn new(token_codec: Arc<dyn TokenCodec>, credential_store: Arc<dyn CredentialStore>) -> Self {
        Self {
            token_codec,
            credential_store,
        }
    }

    /// Without a Bearer header this is a no-op. An unknown session is an error,
    /// not an idempotent success.
    pub async fn log_out(
        &self,
        authorization: Option<&str>,
        ctx: &mut RequestContext,
    ) -> Result<(), AuthError> {
        let Some(token) = bearer_token(authorization) else {
            return Ok(());
        };

        let session_id = self.token_codec.session_id_of(token)?;

        if self
            .credential_store
            .find_by_session_id(&session_id)
            .await?
            .is_none()
        {
            warn!(%session_id, "logout for unknown session");
            return Err(AuthError::CredentialNotFound);
        }

        self.credential_store
            .delete_by_session_id(&session_id)
            .await?;
        ctx.clear();
        info!(%session_id, "logged out");
        Ok(())
    }
}
