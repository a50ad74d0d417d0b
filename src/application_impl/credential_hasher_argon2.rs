use crate::application_port::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

// Library default cost (m=19456, t=2, p=1), so verifying it takes as long as a real hash.
const DECOY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dG9sbGdhdGVkZWNveXNhbA$0Nw5CXgRnHPdYxdhlLxVoGjnJE4XAHsdSHISbQbk9cc";

/// Argon2id with library defaults, PHC-encoded.
pub struct Argon2CredentialHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2CredentialHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
        }
    }

    fn decoy_hash(&self) -> &str {
        DECOY_HASH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = Argon2CredentialHasher;
        let hash = hasher.hash_password("s3cret!").await.unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify_password("s3cret!", &hash).await.unwrap());
        assert!(!hasher.verify_password("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn decoy_hash_parses_and_matches_nothing() {
        let hasher = Argon2CredentialHasher;
        let decoy = hasher.decoy_hash();

        assert!(PasswordHash::new(decoy).is_ok());
        assert!(!hasher.verify_password("", decoy).await.unwrap());
        assert!(!hasher.verify_password("s3cret!", decoy).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_internal_error() {
        let hasher = Argon2CredentialHasher;
        let result = hasher.verify_password("x", "not-a-phc-string").await;
        assert!(matches!(result, Err(AuthError::InternalError(_))));
    }
}
