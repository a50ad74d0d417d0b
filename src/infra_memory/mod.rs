//! Process-local backends for the `memory` store setting and for tests.

mod credential_store_memory;
mod principal_repo_memory;

pub use credential_store_memory::*;
pub use principal_repo_memory::*;
