use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_TIMEOUT_MINUTES;

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Where and how to reach the cluster API server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// API server URL (e.g., "https://127.0.0.1:6443").
    #[serde(default = "default_server")]
    pub server: String,
    /// Bearer token sent with the console request.
    #[serde(default)]
    pub token: Option<String>,
    /// Namespace used when none is given on the command line.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Console session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Minutes to wait for the console to open (default: 5).
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
}

fn default_server() -> String {
    "https://127.0.0.1:6443".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_timeout_minutes() -> u64 {
    DEFAULT_TIMEOUT_MINUTES
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            token: None,
            namespace: default_namespace(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
        }
    }
}
