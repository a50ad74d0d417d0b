use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    credential: AuthenticationCredential,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// `DashMap`-backed credential store.
///
/// Built either in durable mode (records live until deleted) or with a TTL,
/// in which case every save resets the entry's deadline. Expired entries
/// are dropped when looked up and swept on every save, matching the ephemeral backend.
pub struct InMemoryCredentialStore {
    entries: DashMap<SessionId, Entry>,
    ttl: Option<Duration>,
}

impl InMemoryCredentialStore {
    pub fn durable() -> Self {
        Self {
            entries: DashMap::new(),
            ttl: None,
        }
    }

    pub fn ephemeral(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    /// Live records only.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry whose deadline has passed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now));
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn save(
        &self,
        credential: AuthenticationCredential,
    ) -> Result<AuthenticationCredential, CredentialStoreError> {
        // Rotated-away sessions are never looked up again; sweep them here.
        self.purge_expired();

        let expires_at = match self.ttl {
            Some(ttl) => Some(Instant::now().checked_add(ttl).ok_or_else(|| {
                CredentialStoreError::Store(format!("ttl {ttl:?} overflows the clock"))
            })?),
            None => None,
        };
        let entry = Entry {
            credential: credential.clone(),
            expires_at,
        };
        self.entries.insert(credential.session_id.clone(), entry);
        Ok(credential)
    }

    async fn find_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<AuthenticationCredential>, CredentialStoreError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(session_id) {
            if entry.is_live(now) {
                return Ok(Some(entry.credential.clone()));
            }
        }
        self.entries.remove_if(session_id, |_, e| !e.is_live(now));
        Ok(None)
    }

    async fn delete_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<(), CredentialStoreError> {
        self.entries.remove(session_id);
        Ok(())
    }

    async fn delete_if_refresh_token_matches(
        &self,
        session_id: &SessionId,
        refresh_token: &str,
    ) -> Result<bool, CredentialStoreError> {
        let now = Instant::now();
        let removed = self.entries.remove_if(session_id, |_, e| {
            e.is_live(now) && e.credential.refresh_token == refresh_token
        });
        Ok(removed.is_some())
    }

    async fn delete_all(&self) -> Result<(), CredentialStoreError> {
        self.entries.clear();
        Ok(())
    }
}
