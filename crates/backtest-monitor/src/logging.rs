//! Logging setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Filter directive, e.g. `info` or `backtest_engine=debug`. `RUST_LOG` wins.
    pub level: String,
    pub format: LogFormat,
    /// Also write plain (non-ANSI) lines to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Cannot open log file {path}: {reason}")]
    File { path: PathBuf, reason: String },

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi).with_target(true);
    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

fn file_writer(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let file_error = |reason: String| LoggingError::File {
        path: path.to_path_buf(),
        reason,
    };

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| file_error("path has no file name".to_string()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| file_error(e.to_string()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| file_error(e.to_string()))
}

/// Build the env filter, preferring `RUST_LOG` over the configured level.
pub(crate) fn env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
            directive: level.to_string(),
            reason: e.to_string(),
        })
    })
}

/// Install the global subscriber.
///
/// Logs go to stderr, and to `options.file` when set. Keep the returned guard
/// alive for as long as file logging is needed; dropping it flushes the file.
pub fn setup_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = env_filter(&options.level)?;

    let mut layers = vec![fmt_layer(options.format, std::io::stderr, true)];
    let guard = match &options.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_writer(path)?);
            layers.push(fmt_layer(options.format, writer, false));
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "info");
        assert_eq!(options.format, LogFormat::Pretty);
        assert!(options.file.is_none());
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(
            env_filter("backtest_engine=notalevel"),
            Err(LoggingError::InvalidFilter { .. })
        ));
        assert!(env_filter("warn,backtest_engine=debug").is_ok());
    }

    #[test]
    fn test_file_sink_and_single_install() {
        let dir = std::env::temp_dir().join(format!("backtest-monitor-{}", std::process::id()));
        let options = LoggingOptions {
            level: "debug".to_string(),
            format: LogFormat::Json,
            file: Some(dir.join("run.log")),
        };

        let guard = setup_logging(&options).unwrap();
        assert!(guard.is_some());
        tracing::info!("written to file");
        drop(guard);
        assert!(dir.join("run.log").exists());

        assert!(matches!(
            setup_logging(&LoggingOptions::default()),
            Err(LoggingError::AlreadyInitialized(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
