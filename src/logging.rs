//! Logging infrastructure using tracing + tracing-subscriber
//!
//! Features:
//! - Console output on stderr (stdout is reserved for command output)
//! - File logging with rotation
//! - JSON format option
//! - Per-module log levels via RUST_LOG

use std::fs;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

/// Dependencies that are only interesting when they misbehave
const QUIET_TARGETS: &[&str] = &["hyper", "reqwest", "rustls", "h2"];

/// Flushes the log file when dropped; hold it until the command finishes
pub struct LogGuards {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize logging from the `[logging]` section and the -v/-q flags.
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = determine_level(settings, verbose, quiet);
    let env_filter = build_env_filter(level)?;
    let console_layer = format_layer(std::io::stderr, settings.json_format, true);

    let (file_layer, file_guard) = match settings.file.as_deref() {
        Some(log_file) => {
            let (layer, guard) = build_file_layer(
                log_file,
                settings.max_file_size_mb,
                settings.max_files,
                settings.json_format,
            )?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        level = %level,
        file = ?settings.file,
        json = settings.json_format,
        "Logging initialized"
    );

    Ok(LogGuards {
        _file_guard: file_guard,
    })
}

/// Determine the effective log level based on settings and CLI flags
fn determine_level(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => parse_level(&settings.level),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Parse a log level string
fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn directive(value: &str) -> Result<Directive> {
    value.parse()
        .map_err(|e| Error::Config(format!("Invalid log directive '{}': {}", value, e)))
}

/// Build the environment filter with support for RUST_LOG
fn build_env_filter(level: Level) -> Result<EnvFilter> {
    let base_filter = level.to_string().to_lowercase();

    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&base_filter))
        .add_directive(directive(&format!("persona_forge={}", base_filter))?);

    for target in QUIET_TARGETS {
        filter = filter.add_directive(directive(&format!("{}=warn", target))?);
    }

    Ok(filter)
}

/// One formatting layer; console output is compact and coloured, files carry
/// targets and source locations
fn format_layer<S, W>(writer: W, json_format: bool, console: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json_format {
        return Box::new(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false),
        );
    }

    let layer = fmt::layer().with_writer(writer).with_ansi(console);
    if console {
        Box::new(layer.with_target(false).compact())
    } else {
        Box::new(layer.with_target(true).with_file(true).with_line_number(true))
    }
}

/// Rolling file layer. tracing-appender rotates on time only, so small size
/// limits rotate hourly.
fn build_file_layer<S>(
    log_file: &str,
    max_size_mb: u64,
    max_files: u32,
    json_format: bool,
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard)>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let path = Path::new(log_file);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(directory).map_err(|e| Error::io_write(directory, e))?;

    let prefix = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("persona-forge");
    let rotation = match max_size_mb {
        1..=9 => Rotation::HOURLY,
        _ => Rotation::DAILY,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(max_files.max(1) as usize)
        .build(directory)
        .map_err(|e| Error::Config(format!("Failed to create log file appender: {}", e)))?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((format_layer(writer, json_format, false), guard))
}

/// Minimal stderr logging for commands that do not load configuration
pub fn init_simple(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    tracing_subscriber::registry()
        .with(filter)
        .with(format_layer(std::io::stderr, false, true))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("invalid"), Level::INFO);
    }

    #[test]
    fn test_determine_level() {
        let mut settings = LoggingSettings::default();
        assert_eq!(determine_level(&settings, 0, true), Level::ERROR);
        assert_eq!(determine_level(&settings, 0, false), Level::INFO);
        assert_eq!(determine_level(&settings, 1, false), Level::DEBUG);
        assert_eq!(determine_level(&settings, 3, false), Level::TRACE);

        settings.level = "warn".to_string();
        assert_eq!(determine_level(&settings, 0, false), Level::WARN);
    }

    #[test]
    fn test_build_env_filter() {
        assert!(build_env_filter(Level::DEBUG).is_ok());
        assert!(directive("persona_forge=debug").is_ok());
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("forge.log");

        let result = build_file_layer::<tracing_subscriber::Registry>(
            &log_path.to_string_lossy(),
            100,
            5,
            false,
        );

        assert!(result.is_ok());
        assert!(temp_dir.path().join("logs").exists());
    }
}
