use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Where log output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to the log file; stderr is owned by the terminal UI
    File,
    /// One-shot commands log straight to stderr
    Stderr,
}

pub fn log_file_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

    Ok(cache_dir.join("knowledge-bot").join("knowledge-bot.log"))
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(target: LogTarget) -> Result<()> {
    match target {
        LogTarget::File => {
            let path = log_file_path()?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;

            tracing_subscriber::fmt()
                .with_env_filter(env_filter("knowledge_bot=info"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {}", e))?;
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("knowledge_bot=warn"))
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {}", e))?;
        }
    }
    Ok(())
}

fn env_filter(default: &str) -> EnvFilter {
    // "knowledge_bot" prefix-matches both the core and the tui crate targets
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
