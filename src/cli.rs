//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::stream::ConsoleTarget;

const CONSOLE_EXAMPLES: &str = "\
Examples:
  # Connect to the console on VirtualMachineInstance 'myvmi':
  vmconsole console myvmi
  # Configure one minute timeout (default 5 minutes)
  vmconsole console --timeout=1 myvmi";

#[derive(Debug, Parser)]
#[command(name = "vmconsole", version, about = "Serial console access for virtual machine instances")]
pub struct Cli {
    /// Namespace of the virtual machine instance.
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Path to the configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to a console of a virtual machine instance.
    #[command(after_help = CONSOLE_EXAMPLES)]
    Console(ConsoleArgs),
}

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Name of the virtual machine instance.
    #[arg(value_name = "VMI")]
    pub vmi: String,

    /// The number of minutes to wait for the virtual machine instance to be ready.
    #[arg(long, value_name = "MINUTES")]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config, crate::config::ConfigError> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    /// Namespace from the command line, falling back to the configured one.
    pub fn namespace<'a>(&'a self, config: &'a Config) -> &'a str {
        self.namespace
            .as_deref()
            .unwrap_or(config.cluster.namespace.as_str())
    }
}

impl ConsoleArgs {
    pub fn target(&self, namespace: &str) -> ConsoleTarget {
        ConsoleTarget::new(namespace, self.vmi.clone())
    }

    /// Timeout from the command line, falling back to the configured one.
    pub fn timeout_minutes(&self, config: &Config) -> u64 {
        self.timeout.unwrap_or(config.console.timeout_minutes)
    }
}
