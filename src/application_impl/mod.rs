mod auth_service_impl;
mod authentication_gate;
mod credential_hasher_argon2;
mod credential_issuer;
mod revocation_handler;
mod token_codec_jwt;
mod validation;

pub use auth_service_impl::*;
pub use authentication_gate::*;
pub use credential_hasher_argon2::*;
pub use credential_issuer::*;
pub use revocation_handler::*;
pub use token_codec_jwt::*;
pub use validation::*;
