use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(pub String);

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member as seen by the credential lifecycle: read-only, looked up by subject.
#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: String,
    pub secret_hash: String,
    pub authorities: Vec<Authority>,
    pub active: bool,
}
