use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;
use std::time::Duration;

/// Mints a fresh session id and a linked access/refresh pair for a principal.
pub struct CredentialIssuer {
    token_codec: Arc<dyn TokenCodec>,
    session_ids: Arc<dyn SessionIdGenerator>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl CredentialIssuer {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        session_ids: Arc<dyn SessionIdGenerator>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            token_codec,
            session_ids,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue(&self, principal: &Principal) -> Result<AuthenticationCredential, AuthError> {
        let session_id = self.session_ids.generate();

        let (access_token, access_expires_at) =
            self.token_codec
                .issue(&principal.subject, &session_id, self.access_ttl)?;
        let (refresh_token, refresh_expires_at) =
            self.token_codec
                .issue(&principal.subject, &session_id, self.refresh_ttl)?;

        Ok(AuthenticationCredential {
            session_id,
            access_token,
            refresh_token,
            owner_id: Some(principal.subject.clone()),
            access_expires_at,
            refresh_expires_at,
        })
    }
}

impl From<&AuthenticationCredential> for AuthTokens {
    fn from(credential: &AuthenticationCredential) -> Self {
        AuthTokens {
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            access_token_expires_at: credential.access_expires_at,
            refresh_token_expires_at: credential.refresh_expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{JwtConfig, JwtHs256Codec, UuidSessionIdGenerator};

    fn issuer() -> (CredentialIssuer, Arc<dyn TokenCodec>) {
        let codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: "tollgate.test".to_string(),
            signing_key: b"issuer-test-key".to_vec(),
        }));
        let issuer = CredentialIssuer::new(
            codec.clone(),
            Arc::new(UuidSessionIdGenerator),
            Duration::from_secs(60),
            Duration::from_secs(3600),
        );
        (issuer, codec)
    }

    fn principal() -> Principal {
        Principal {
            subject: "010-1234-5678".to_string(),
            secret_hash: String::new(),
            authorities: vec![Authority("STAFF".to_string())],
            active: true,
        }
    }

    #[test]
    fn both_tokens_embed_the_record_session_id() {
        let (issuer, codec) = issuer();
        let credential = issuer.issue(&principal()).unwrap();

        assert_eq!(
            codec.session_id_of(&credential.refresh_token).unwrap(),
            credential.session_id
        );
        assert_eq!(
            codec.session_id_of(&credential.access_token).unwrap(),
            credential.session_id
        );
        assert_eq!(credential.owner_id.as_deref(), Some("010-1234-5678"));
        assert!(credential.refresh_expires_at > credential.access_expires_at);
    }

    #[test]
    fn every_issue_gets_a_new_session() {
        let (issuer, _) = issuer();
        let a = issuer.issue(&principal()).unwrap();
        let b = issuer.issue(&principal()).unwrap();

        assert_ne!(a.session_id, b.session_id);
        assert_ne!(a.refresh_token, b.refresh_token);
    }
}
