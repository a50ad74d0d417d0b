use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Token from an `Authorization` header value, if it uses the Bearer scheme.
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    authorization
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty())
}

/// Allow-list entry. `/prefix/**` matches the prefix and everything below it;
/// anything else must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(prefix) => PathPattern::Prefix(prefix.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Prefix(p) => {
                path == p
                    || path
                        .strip_prefix(p.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

/// Populates request identity from a presented access token.
///
/// Never fails: any check that does not pass leaves the request
/// unauthenticated and authorization is decided further down the chain.
pub struct AuthenticationGate {
    token_codec: Arc<dyn TokenCodec>,
    credential_store: Arc<dyn CredentialStore>,
    principal_repo: Arc<dyn PrincipalRepo>,
    allow_list: Vec<PathPattern>,
}

impl AuthenticationGate {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        credential_store: Arc<dyn CredentialStore>,
        principal_repo: Arc<dyn PrincipalRepo>,
        allow_list: &[String],
    ) -> Self {
        Self {
            token_codec,
            credential_store,
            principal_repo,
            allow_list: allow_list.iter().map(|p| PathPattern::parse(p)).collect(),
        }
    }

    fn is_allowed(&self, path: &str) -> bool {
        self.allow_list.iter().any(|p| p.matches(path))
    }

    pub async fn authenticate(
        &self,
        path: &str,
        authorization: Option<&str>,
        ctx: &mut RequestContext,
    ) {
        if self.is_allowed(path) {
            return;
        }
        let Some(token) = bearer_token(authorization) else {
            return;
        };

        let (subject, session_id) = match (
            self.token_codec.subject_of(token),
            self.token_codec.session_id_of(token),
        ) {
            (Ok(subject), Ok(session_id)) => (subject, session_id),
            _ => {
                debug!(path, "unreadable bearer token, continuing unauthenticated");
                return;
            }
        };

        let stored = match self.credential_store.find_by_session_id(&session_id).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "credential lookup failed in gate");
                return;
            }
        };
        match stored {
            Some(stored) if stored.access_token == token => {}
            _ => {
                debug!(path, "bearer token has no live credential");
                return;
            }
        }

        if ctx.is_authenticated() {
            return;
        }

        let principal = match self.principal_repo.find_by_subject(&subject).await {
            Ok(Some(principal)) => principal,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "principal lookup failed in gate");
                return;
            }
        };
        if !self.token_codec.is_structurally_valid(&principal.subject, token) {
            debug!(path, "access token failed validation");
            return;
        }

        ctx.set_identity(Identity {
            subject: principal.subject,
            authorities: principal.authorities,
        });
    }
}
