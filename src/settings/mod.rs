//! Process settings: a TOML file layered with `TOLLGATE__*` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
