// store

mod credential_store;

pub use credential_store::*;

// repo

mod principal_repo;

pub use principal_repo::*;
