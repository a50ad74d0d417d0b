use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::time::Duration;

const CREDENTIAL_COMPARE_AND_DELETE: &str = include_str!("credential_compare_and_delete.lua");
const SCAN_BATCH: usize = 200;

/// Ephemeral backend: one JSON value per session under `{prefix}:{session_id}`,
/// written with `SET .. EX ttl` so every save restarts the expiry.
pub struct RedisCredentialStore {
    conn: ConnectionManager,
    prefix: String,
    ttl: Duration,
}

impl RedisCredentialStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, ttl: Duration) -> Self {
        RedisCredentialStore {
            conn,
            prefix: prefix.into(),
            ttl,
        }
    }

    fn key(&self, session_id: &SessionId) -> String {
        format!("{}:{}", self.prefix, session_id)
    }

    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }
}

#[async_trait::async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn save(
        &self,
        credential: AuthenticationCredential,
    ) -> Result<AuthenticationCredential, CredentialStoreError> {
        let key = self.key(&credential.session_id);
        let value = serde_json::to_string(&credential)
            .map_err(|e| CredentialStoreError::Encoding(e.to_string()))?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, value, self.ttl_secs())
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        Ok(credential)
    }

    async fn find_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<AuthenticationCredential>, CredentialStoreError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        val.map(|raw| {
            serde_json::from_str::<AuthenticationCredential>(&raw)
                .map_err(|e| CredentialStoreError::Encoding(e.to_string()))
        })
        .transpose()
    }

    async fn delete_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<(), CredentialStoreError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        Ok(())
    }

    async fn delete_if_refresh_token_matches(
        &self,
        session_id: &SessionId,
        refresh_token: &str,
    ) -> Result<bool, CredentialStoreError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let script = Script::new(CREDENTIAL_COMPARE_AND_DELETE);
        let deleted: i64 = script
            .key(&key)
            .arg(refresh_token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
        Ok(deleted == 1)
    }

    async fn delete_all(&self) -> Result<(), CredentialStoreError> {
        let pattern = format!("{}:*", self.prefix);
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
            if !keys.is_empty() {
                let _: () = conn
                    .del(keys)
                    .await
                    .map_err(|e| CredentialStoreError::Store(e.to_string()))?;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(())
    }
}
