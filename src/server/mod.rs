mod prune;
mod server;

pub use prune::*;
pub use server::*;
