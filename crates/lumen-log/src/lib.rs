//! Structured logging for Lumen.
//!
//! Console output with uptime timestamps and module paths, plus an optional
//! JSON log file for post-mortem analysis. The render and config crates log
//! through the `log` facade, which the subscriber picks up through its
//! `tracing-log` bridge.

use std::fs::File;
use std::path::{Path, PathBuf};

use lumen_config::Config;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE_NAME: &str = "lumen.log";

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log directory or file could not be created.
    #[error("failed to create log file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter directives from the config, falling back to [`DEFAULT_FILTER`].
pub fn filter_directives(config: Option<&Config>) -> &str {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => config.debug.log_level.trim(),
        _ => DEFAULT_FILTER,
    }
}

/// `RUST_LOG` when set, otherwise the config's level.
pub fn build_filter(config: Option<&Config>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(config)))
}

/// JSON lines layer writing to `file`.
pub fn json_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .json()
}

/// Install the global tracing subscriber.
///
/// The JSON file layer is added when `log_dir` is given and either
/// `debug_build` is set or the config asks for it. Returns the log file path
/// when one was opened.
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Result<Option<PathBuf>, LogError> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(console_layer);

    let wants_file = debug_build || config.is_some_and(|c| c.debug.log_to_file);
    if wants_file && let Some(log_dir) = log_dir {
        let path = log_dir.join(LOG_FILE_NAME);
        let file = std::fs::create_dir_all(log_dir)
            .and_then(|()| File::create(&path))
            .map_err(|source| LogError::File {
                path: path.clone(),
                source,
            })?;
        subscriber.with(json_file_layer(file)).try_init()?;
        return Ok(Some(path));
    }

    subscriber.try_init()?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(filter_directives(None), "info");

        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_config_level_is_used() {
        let mut config = Config::default();
        config.debug.log_level = "warn,lumen_render=trace".to_string();
        assert_eq!(filter_directives(Some(&config)), "warn,lumen_render=trace");

        let filter = EnvFilter::new(filter_directives(Some(&config)));
        let filter_str = filter.to_string();
        assert!(filter_str.contains("lumen_render=trace"));
        assert!(filter_str.contains("warn"));
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,lumen_render=trace",
            "warn,lumen_render::pool=debug,lumen_config=info",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_new(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {filter_str}");
        }
    }

    #[test]
    fn test_json_file_layer_writes_json_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(LOG_FILE_NAME);
        let file = File::create(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(json_file_layer(file));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(depth = 6, "bloom composited");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().unwrap();
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["fields"]["message"], "bloom composited");
        assert_eq!(value["fields"]["depth"], 6);
    }
}
