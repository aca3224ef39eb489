use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "speedtrainer=info";
const VERBOSE_LOG_FILTER: &str = "speedtrainer=debug";

/// Where log lines go
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    /// The TUI owns the terminal and no log file was asked for
    Off,
}

/// Install the global fmt subscriber. `RUST_LOG` overrides the level.
pub fn setup(target: LogTarget<'_>, verbose: bool) -> Result<()> {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_owned());
    let filter = EnvFilter::builder().parse_lossy(directives);

    match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogTarget::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_target(false)
                .with_ansi(false)
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogTarget::Off => {}
    }

    Ok(())
}
