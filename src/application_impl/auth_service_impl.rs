use super::CredentialIssuer;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use serde::Deserialize;
use std::sync::Arc;

/// What happens to the presented session once a refresh has been accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshRotation {
    /// The previous record stays in the store; only a new one is written.
    #[default]
    Retain,
    /// The previous record is compare-and-deleted before the new pair is issued,
    /// so at most one concurrent refresh of a given token can win.
    Consume,
}

pub struct RealAuthService {
    principal_repo: Arc<dyn PrincipalRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    credential_issuer: Arc<CredentialIssuer>,
    credential_store: Arc<dyn CredentialStore>,
    rotation: RefreshRotation,
}

impl RealAuthService {
    pub fn new(
        principal_repo: Arc<dyn PrincipalRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        credential_issuer: Arc<CredentialIssuer>,
        credential_store: Arc<dyn CredentialStore>,
        rotation: RefreshRotation,
    ) -> Self {
        Self {
            principal_repo,
            credential_hasher,
            token_codec,
            credential_issuer,
            credential_store,
            rotation,
        }
    }

    async fn authenticate(&self, input: &LogInInput) -> Result<Principal, AuthError> {
        let principal = match self.principal_repo.find_by_subject(&input.subject).await? {
            Some(principal) if principal.active => principal,
            _ => {
                // Same hashing work as a wrong secret for a known subject.
                let _ = self
                    .credential_hasher
                    .verify_password(&input.secret, self.credential_hasher.decoy_hash())
                    .await;
                return Err(AuthError::BadCredentials);
            }
        };

        let ok = self
            .credential_hasher
            .verify_password(&input.secret, &principal.secret_hash)
            .await?;
        if !ok {
            return Err(AuthError::BadCredentials);
        }

        Ok(principal)
    }

    fn validate_refresh_token(
        &self,
        presented: &str,
        stored: &AuthenticationCredential,
        subject: &str,
    ) -> Result<(), AuthError> {
        if presented != stored.refresh_token {
            warn!(session_id = %stored.session_id, "refresh token does not match stored credential");
            return Err(AuthError::TokenMismatch);
        }
        if !self.token_codec.is_structurally_valid(subject, presented) {
            warn!(session_id = %stored.session_id, "refresh token failed validation");
            return Err(AuthError::InvalidRefreshToken);
        }
        Ok(())
    }

    /// An access token that has not reached its own expiry yet means the pair is
    /// being refreshed early; the whole session is revoked.
    async fn validate_access_token_elapsed(
        &self,
        stored: &AuthenticationCredential,
    ) -> Result<(), AuthError> {
        if !self
            .token_codec
            .is_expired_by_wall_clock(&stored.access_token)?
        {
            self.credential_store
                .delete_by_session_id(&stored.session_id)
                .await?;
            warn!(session_id = %stored.session_id, "premature refresh, session revoked");
            return Err(AuthError::InvalidTokenReissueRequest);
        }
        Ok(())
    }

    async fn issue_and_save(&self, principal: &Principal) -> Result<AuthTokens, AuthError> {
        let credential = self.credential_issuer.issue(principal)?;
        let saved = self.credential_store.save(credential).await?;
        debug!(session_id = %saved.session_id, subject = %principal.subject, "credential issued");
        Ok(AuthTokens::from(&saved))
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn log_in(&self, request: LogInInput) -> Result<AuthTokens, AuthError> {
        let principal = self.authenticate(&request).await?;
        let tokens = self.issue_and_save(&principal).await?;
        info!(subject = %principal.subject, "signed in");
        Ok(tokens)
    }

    async fn refresh(&self, presented_refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let presented = presented_refresh_token;

        let subject = self.token_codec.subject_of(presented)?;
        let session_id = self.token_codec.session_id_of(presented)?;

        let principal = self
            .principal_repo
            .find_by_subject(&subject)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        let stored = self
            .credential_store
            .find_by_session_id(&session_id)
            .await?
            .ok_or(AuthError::CredentialNotFound)?;

        self.validate_refresh_token(presented, &stored, &subject)?;
        self.validate_access_token_elapsed(&stored).await?;

        if self.rotation == RefreshRotation::Consume
            && !self
                .credential_store
                .delete_if_refresh_token_matches(&session_id, presented)
                .await?
        {
            warn!(%session_id, "refresh lost a race for the same session");
            return Err(AuthError::CredentialNotFound);
        }

        let tokens = self.issue_and_save(&principal).await?;
        info!(%subject, previous_session_id = %session_id, "credential rotated");
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{JwtConfig, JwtHs256Codec, UuidSessionIdGenerator};
    use crate::infra_memory::*;
    use std::time::Duration;

    struct PlainTextHasher;

    #[async_trait::async_trait]
    impl CredentialHasher for PlainTextHasher {
        async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
            Ok(format!("plain:{password}"))
        }

        async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
            Ok(hash.strip_prefix("plain:") == Some(password))
        }

        fn decoy_hash(&self) -> &str {
            "decoy"
        }
    }

    /// Records every hash it is asked to verify against.
    #[derive(Default)]
    struct RecordingHasher {
        verified: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl CredentialHasher for RecordingHasher {
        async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
            Ok(format!("plain:{password}"))
        }

        async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
            self.verified.lock().unwrap().push(hash.to_string());
            Ok(hash.strip_prefix("plain:") == Some(password))
        }

        fn decoy_hash(&self) -> &str {
            "decoy"
        }
    }

    struct Fixture {
        service: RealAuthService,
        store: Arc<InMemoryCredentialStore>,
        principals: Arc<InMemoryPrincipalRepo>,
        codec: Arc<dyn TokenCodec>,
    }

    fn fixture(access_ttl: Duration, rotation: RefreshRotation) -> Fixture {
        let codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: "tollgate.test".to_string(),
            signing_key: b"orchestrator-test-key".to_vec(),
        }));
        let issuer = Arc::new(CredentialIssuer::new(
            codec.clone(),
            Arc::new(UuidSessionIdGenerator),
            access_ttl,
            Duration::from_secs(3600),
        ));
        let store = Arc::new(InMemoryCredentialStore::durable());
        let principals = Arc::new(InMemoryPrincipalRepo::new());
        principals.insert(Principal {
            subject: "u1".to_string(),
            secret_hash: "plain:pw".to_string(),
            authorities: vec![Authority("STAFF".to_string())],
            active: true,
        });
        let service = RealAuthService::new(
            principals.clone(),
            Arc::new(PlainTextHasher),
            codec.clone(),
            issuer,
            store.clone(),
            rotation,
        );
        Fixture {
            service,
            store,
            principals,
            codec,
        }
    }

    fn log_in_input(secret: &str) -> LogInInput {
        LogInInput {
            subject: "u1".to_string(),
            secret: secret.to_string(),
        }
    }

    #[tokio::test]
    async fn log_in_saves_the_issued_pair() {
        let f = fixture(Duration::from_secs(60), RefreshRotation::Retain);

        let tokens = f.service.log_in(log_in_input("pw")).await.unwrap();

        let sid = f.codec.session_id_of(&tokens.refresh_token).unwrap();
        let stored = f.store.find_by_session_id(&sid).await.unwrap().unwrap();
        assert_eq!(stored.access_token, tokens.access_token);
        assert_eq!(stored.refresh_token, tokens.refresh_token);
    }

    #[tokio::test]
    async fn log_in_with_wrong_secret_is_bad_credentials() {
        let f = fixture(Duration::from_secs(60), RefreshRotation::Retain);

        let result = f.service.log_in(log_in_input("nope")).await;

        assert!(matches!(result, Err(AuthError::BadCredentials)));
        assert_eq!(f.store.len(), 0);
    }

    #[tokio::test]
    async fn unknown_subject_still_verifies_against_the_decoy() {
        let f = fixture(Duration::from_secs(60), RefreshRotation::Retain);
        f.principals.deactivate("u1");
        let hasher = Arc::new(RecordingHasher::default());
        let service = RealAuthService::new(
            f.principals.clone(),
            hasher.clone(),
            f.codec.clone(),
            Arc::new(CredentialIssuer::new(
                f.codec.clone(),
                Arc::new(UuidSessionIdGenerator),
                Duration::from_secs(60),
                Duration::from_secs(3600),
            )),
            f.store.clone(),
            RefreshRotation::Retain,
        );

        let unknown = service
            .log_in(LogInInput {
                subject: "nobody".to_string(),
                secret: "pw".to_string(),
            })
            .await;
        let inactive = service.log_in(log_in_input("pw")).await;

        assert!(matches!(unknown, Err(AuthError::BadCredentials)));
        assert!(matches!(inactive, Err(AuthError::BadCredentials)));
        assert_eq!(
            *hasher.verified.lock().unwrap(),
            vec!["decoy".to_string(), "decoy".to_string()]
        );
    }

    #[tokio::test]
    async fn log_in_for_inactive_principal_is_bad_credentials() {
        let f = fixture(Duration::from_secs(60), RefreshRotation::Retain);
        f.principals.deactivate("u1");

        let result = f.service.log_in(log_in_input("pw")).await;

        assert!(matches!(result, Err(AuthError::BadCredentials)));
    }

    #[tokio::test]
    async fn premature_refresh_revokes_the_session() {
        let f = fixture(Duration::from_secs(60), RefreshRotation::Retain);
        let tokens = f.service.log_in(log_in_input("pw")).await.unwrap();
        let sid = f.codec.session_id_of(&tokens.refresh_token).unwrap();

        let first = f.service.refresh(&tokens.refresh_token).await;
        assert!(matches!(first, Err(AuthError::InvalidTokenReissueRequest)));
        assert!(f.store.find_by_session_id(&sid).await.unwrap().is_none());

        let second = f.service.refresh(&tokens.refresh_token).await;
        assert!(matches!(second, Err(AuthError::CredentialNotFound)));
    }

    #[tokio::test]
    async fn refresh_after_access_expiry_rotates_to_a_new_session() {
        let f = fixture(Duration::ZERO, RefreshRotation::Retain);
        let first = f.service.log_in(log_in_input("pw")).await.unwrap();
        let s1 = f.codec.session_id_of(&first.refresh_token).unwrap();

        let second = f.service.refresh(&first.refresh_token).await.unwrap();
        let s2 = f.codec.session_id_of(&second.refresh_token).unwrap();

        assert_ne!(s1, s2);
        assert!(f.store.find_by_session_id(&s2).await.unwrap().is_some());
        // retained: the previous record is left in place
        assert!(f.store.find_by_session_id(&s1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn consume_rotation_makes_old_refresh_token_single_use() {
        let f = fixture(Duration::ZERO, RefreshRotation::Consume);
        let first = f.service.log_in(log_in_input("pw")).await.unwrap();
        let s1 = f.codec.session_id_of(&first.refresh_token).unwrap();

        f.service.refresh(&first.refresh_token).await.unwrap();

        assert!(f.store.find_by_session_id(&s1).await.unwrap().is_none());
        let replay = f.service.refresh(&first.refresh_token).await;
        assert!(matches!(replay, Err(AuthError::CredentialNotFound)));
    }

    #[tokio::test]
    async fn superseded_refresh_token_is_a_mismatch() {
        let f = fixture(Duration::ZERO, RefreshRotation::Retain);
        let tokens = f.service.log_in(log_in_input("pw")).await.unwrap();
        let sid = f.codec.session_id_of(&tokens.refresh_token).unwrap();

        // Same session id, different token value: an older token for the session.
        let (stale, _) = f
            .codec
            .issue("u1", &sid, Duration::from_secs(1800))
            .unwrap();

        let result = f.service.refresh(&stale).await;
        assert!(matches!(result, Err(AuthError::TokenMismatch)));
    }

    #[tokio::test]
    async fn refresh_for_unknown_principal_fails_before_store_lookup() {
        let f = fixture(Duration::ZERO, RefreshRotation::Retain);
        let tokens = f.service.log_in(log_in_input("pw")).await.unwrap();
        f.principals.deactivate("u1");

        let result = f.service.refresh(&tokens.refresh_token).await;
        assert!(matches!(result, Err(AuthError::PrincipalNotFound)));
    }

    #[tokio::test]
    async fn expired_refresh_token_is_invalid() {
        let codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: "tollgate.test".to_string(),
            signing_key: b"orchestrator-test-key".to_vec(),
        }));
        let issuer = Arc::new(CredentialIssuer::new(
            codec.clone(),
            Arc::new(UuidSessionIdGenerator),
            Duration::ZERO,
            Duration::ZERO,
        ));
        let f = fixture(Duration::ZERO, RefreshRotation::Retain);
        let principal = f.principals.find_by_subject("u1").await.unwrap().unwrap();
        let credential = issuer.issue(&principal).unwrap();
        f.store.save(credential.clone()).await.unwrap();

        let result = f.service.refresh(&credential.refresh_token).await;
        assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    }

    #[tokio::test]
    async fn garbage_refresh_token_is_malformed() {
        let f = fixture(Duration::ZERO, RefreshRotation::Retain);
        let result = f.service.refresh("not-a-token").await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn concurrent_log_ins_get_isolated_sessions() {
        let f = fixture(Duration::from_secs(60), RefreshRotation::Retain);
        let (a, b) = tokio::join!(
            f.service.log_in(log_in_input("pw")),
            f.service.log_in(log_in_input("pw"))
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let sa = f.codec.session_id_of(&a.refresh_token).unwrap();
        let sb = f.codec.session_id_of(&b.refresh_token).unwrap();
        assert_ne!(sa, sb);

        let stored_a = f.store.find_by_session_id(&sa).await.unwrap().unwrap();
        assert_ne!(stored_a.refresh_token, b.refresh_token);
    }
}
