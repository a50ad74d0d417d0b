use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

#[derive(Default)]
pub struct InMemoryPrincipalRepo {
    principals: DashMap<String, Principal>,
}

impl InMemoryPrincipalRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: Principal) {
        self.principals.insert(principal.subject.clone(), principal);
    }

    /// Soft delete; the principal stops resolving but keeps its row.
    pub fn deactivate(&self, subject: &str) {
        if let Some(mut p) = self.principals.get_mut(subject) {
            p.active = false;
        }
    }
}

#[async_trait::async_trait]
impl PrincipalRepo for InMemoryPrincipalRepo {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self
            .principals
            .get(subject)
            .filter(|p| p.active)
            .map(|p| p.value().clone()))
    }
}
