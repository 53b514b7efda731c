//! Process-level context: persisted server configuration

mod config;
mod error;

pub use config::ServerConfigExt;
pub use error::ConfigError;
