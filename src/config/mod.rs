mod loader;
mod types;

pub use loader::{ConfigError, TOKEN_ENV_VAR};
pub use types::{ClusterConfig, Config, ConsoleConfig};
