use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait PrincipalRepo: Send + Sync {
    /// Active principals only; a deactivated member resolves to `None`.
    async fn find_by_subject(&self, subject: &str) -> Result<Option<Principal>, AuthError>;
}
