//! File logging for console sessions.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming the log file.
pub const LOG_ENV_VAR: &str = "VMCONSOLE_LOG";

/// Filter used when `RUST_LOG` is unset. Websocket and TLS internals are
/// noisy at info and only show warnings.
const DEFAULT_FILTER: &str = "info,tungstenite=warn,tokio_tungstenite=warn,rustls=warn";

/// Initialize tracing for a session on the console of `vmi`.
///
/// Nothing is logged unless `VMCONSOLE_LOG` names a file: the terminal is in
/// raw mode while attached and log lines on stderr would land in the console.
/// Each run writes to its own `{path}.{timestamp}.{pid}` file, and its first
/// record names the version and the VMI so sessions can be told apart.
///
/// Returns the file being written, if any.
pub fn init_tracing(vmi: Option<&str>) -> Option<PathBuf> {
    let base = std::env::var_os(LOG_ENV_VAR)?;
    let path = unique_log_path(Path::new(&base));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = fs::create_dir_all(parent) {
            eprintln!("Warning: Failed to create log directory {}: {}", parent.display(), err);
            return None;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: Failed to create log file {}: {}", path.display(), err);
            return None;
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        vmi = vmi.unwrap_or("-"),
        "vmconsole started"
    );
    Some(path)
}

fn unique_log_path(base: &Path) -> PathBuf {
    let pid = std::process::id();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{timestamp}.{pid}"));
    PathBuf::from(name)
}
