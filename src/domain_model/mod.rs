mod credential;
mod identity;
mod principal;
mod session;

pub use credential::*;
pub use identity::*;
pub use principal::*;
pub use session::*;
