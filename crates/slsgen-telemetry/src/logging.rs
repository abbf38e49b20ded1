//! Structured logging to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A generation run is starting.
    pub const RUN_STARTED: &str = "run_started";

    /// The merged configuration has been written.
    pub const RUN_COMPLETED: &str = "run_completed";

    /// A run aborted with a fatal error.
    pub const RUN_FAILED: &str = "run_failed";

    /// Two routes produced the same function name.
    pub const FUNCTION_COLLISION: &str = "function_collision";
}

/// Helper macros for structured logging with standard fields.
#[macro_export]
macro_rules! log_run_started {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::RUN_STARTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_run_completed {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::RUN_COMPLETED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_run_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::RUN_FAILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_function_collision {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::FUNCTION_COLLISION,
            $($field)*
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can only be installed once per process, so
    // only the configuration logic is tested here.

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("invalid"), None);
    }

    #[test]
    fn test_event_names_are_distinct() {
        let names = [
            events::RUN_STARTED,
            events::RUN_COMPLETED,
            events::RUN_FAILED,
            events::FUNCTION_COLLISION,
        ];
        for (i, a) in names.iter().enumerate() {
            assert!(names[i + 1..].iter().all(|b| a != b));
        }
    }
}
