use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Durable backend. Writes run in a transaction, reads go straight to the pool.
/// Rows are never expired by the store itself; see [`MySqlCredentialStore::delete_expired`].
pub struct MySqlCredentialStore {
    pool: MySqlPool,
}

impl MySqlCredentialStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlCredentialStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<AuthenticationCredential, CredentialStoreError> {
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        let access_token: String = row
            .try_get("access_token")
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        let refresh_token: String = row
            .try_get("refresh_token")
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        let owner_id: Option<String> = row
            .try_get("owner_id")
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        let access_expires_at: DateTime<Utc> = row
            .try_get("access_expires_at")
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        let refresh_expires_at: DateTime<Utc> = row
            .try_get("refresh_expires_at")
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        Ok(AuthenticationCredential {
            session_id: SessionId(session_id),
            access_token,
            refresh_token,
            owner_id,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Prunes rows whose refresh token can no longer be used. Returns the number
    /// of rows removed.
    pub async fn delete_expired(&self) -> Result<u64, CredentialStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        let result = sqlx::query("DELETE FROM auth_credential WHERE refresh_expires_at < ?")
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn save(
        &self,
        credential: AuthenticationCredential,
    ) -> Result<AuthenticationCredential, CredentialStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        sqlx::query(
            r#"
INSERT INTO auth_credential
    (session_id, access_token, refresh_token, owner_id, access_expires_at, refresh_expires_at)
VALUES (?, ?, ?, ?, ?, ?)
ON DUPLICATE KEY UPDATE
    access_token = VALUES(access_token),
    refresh_token = VALUES(refresh_token),
    owner_id = VALUES(owner_id),
    access_expires_at = VALUES(access_expires_at),
    refresh_expires_at = VALUES(refresh_expires_at)
"#,
        )
        .bind(credential.session_id.as_str())
        .bind(&credential.access_token)
        .bind(&credential.refresh_token)
        .bind(credential.owner_id.as_deref())
        .bind(credential.access_expires_at)
        .bind(credential.refresh_expires_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        Ok(credential)
    }

    async fn find_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<AuthenticationCredential>, CredentialStoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT session_id, access_token, refresh_token, owner_id, access_expires_at, refresh_expires_at
FROM auth_credential
WHERE session_id = ?
"#,
        )
        .bind(session_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn delete_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<(), CredentialStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        sqlx::query("DELETE FROM auth_credential WHERE session_id = ?")
            .bind(session_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        Ok(())
    }

    async fn delete_if_refresh_token_matches(
        &self,
        session_id: &SessionId,
        refresh_token: &str,
    ) -> Result<bool, CredentialStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        let result =
            sqlx::query("DELETE FROM auth_credential WHERE session_id = ? AND refresh_token = ?")
                .bind(session_id.as_str())
                .bind(refresh_token)
                .execute(&mut *tx)
                .await
                .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_all(&self) -> Result<(), CredentialStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        sqlx::query("DELETE FROM auth_credential")
            .execute(&mut *tx)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;

        Ok(())
    }
}
