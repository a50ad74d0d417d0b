mod credential_store_mysql;
mod principal_repo_mysql;

pub use credential_store_mysql::*;
pub use principal_repo_mysql::*;
