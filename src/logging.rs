use anyhow::Context;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// The terminal belongs to the UI, so diagnostics go to a file.
pub const DEBUG_LOG_FILE: &str = "inboxtui_debug.log";
pub const LOG_ENV: &str = "INBOXTUI_LOG";

/// Installs the file logger when `debug` is set; logging is off otherwise.
pub fn init(debug: bool) -> anyhow::Result<()> {
    if !debug {
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(DEBUG_LOG_FILE)
        .with_context(|| format!("Failed to open {}", DEBUG_LOG_FILE))?;
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("inboxtui=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;

    tracing::info!("debug logging enabled");
    Ok(())
}
