//! Telemetry setup for embedders that want the engine's tracing output and
//! metric descriptions installed process-wide. Entirely optional: the
//! engine emits through the `tracing` and `metrics` facades whether or not
//! anything is listening.

use std::sync::Once;

use metrics::{Unit, describe_counter};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Environment variable overriding the host-chosen log level. Scoped to
/// this crate so an embedded engine never hijacks the host's own
/// `RUST_LOG` configuration.
pub const LOG_ENV_VAR: &str = "RICALCO_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {message}")]
    Subscriber { message: String },
}

/// Install a global tracing subscriber using the provided logging
/// settings. Fails when the host already installed one; embedders that
/// own their telemetry simply never call this.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    // The engine emits plain events, never spans, so the JSON output
    // skips the span fields entirely.
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Subscriber {
            message: err.to_string(),
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "ricalco_convert_total",
            Unit::Count,
            "Total number of conversion calls, labelled by mode and source."
        );
        describe_counter!(
            "ricalco_diagnostics_recorded_total",
            Unit::Count,
            "Total number of diagnostics recorded to an error stack."
        );
        describe_counter!(
            "ricalco_includes_resolved_total",
            Unit::Count,
            "Total number of include directives resolved successfully."
        );
        describe_counter!(
            "ricalco_includes_failed_total",
            Unit::Count,
            "Total number of include directives that failed to resolve or read."
        );
    });
}
