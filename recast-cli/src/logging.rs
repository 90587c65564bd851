//! Logging initialization for recast.
//!
//! Configures `tracing-subscriber` from the `[general]` section of `RecastConfig`:
//! one stderr layer plus, when `log_file` is set, an append-only file layer
//! without ANSI colours. `RUST_LOG` overrides the configured level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use recast_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"text"` - Single-line human-readable output (default)
/// * `"pretty"` - Multi-line human-readable output (for development)
/// * `"json"` - Machine-parseable JSON lines
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(format_layer(&config.log_format, Mutex::new(file), false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(format_layer(&config.log_format, std::io::stderr, true))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))?;

    Ok(())
}

fn format_layer<S, W>(format: &str, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    match format {
        "json" => layer.json().boxed(),
        "pretty" => layer.pretty().boxed(),
        _ => layer.boxed(),
    }
}

/// Open the log file for appending, creating parent directories as needed.
pub fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parent_and_appends() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("logs/recast.log");

        {
            use std::io::Write;
            let mut file = open_log_file(&path).expect("should open log file");
            writeln!(file, "first").expect("should write");
        }
        {
            use std::io::Write;
            let mut file = open_log_file(&path).expect("should reopen log file");
            writeln!(file, "second").expect("should write");
        }

        let contents = std::fs::read_to_string(&path).expect("should read log file");
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_in_unwritable_location_fails() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").expect("should write blocker");

        let err = open_log_file(&blocker.join("recast.log")).expect_err("should fail");
        assert!(err.to_string().contains("cannot create log directory"));
    }
}
