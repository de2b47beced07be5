//! Tracing initialization with configurable logging formats.

use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingConfig, ObservabilityConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the tracing subscriber with the given configuration.
///
/// This sets up console logging in the configured format (pretty, compact,
/// JSON) with environment-based log filtering.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TracingError> {
    let logging = &config.logging;
    let filter = build_env_filter(logging);

    tracing_subscriber::registry()
        .with(build_fmt_layer(logging).with_filter(filter))
        .try_init()
        .map_err(|e| TracingError::Init(e.to_string()))?;

    tracing::debug!(
        format = ?logging.format,
        level = logging.level.as_str(),
        "Tracing initialized"
    );
    Ok(())
}

fn build_fmt_layer(logging: &LoggingConfig) -> BoxedLayer {
    match (logging.format, logging.timestamps) {
        (LogFormat::Pretty, true) => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(logging.file_line)
            .with_line_number(logging.file_line)
            .boxed(),
        (LogFormat::Pretty, false) => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(logging.file_line)
            .with_line_number(logging.file_line)
            .without_time()
            .boxed(),
        (LogFormat::Compact, true) => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_file(logging.file_line)
            .with_line_number(logging.file_line)
            .boxed(),
        (LogFormat::Compact, false) => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_file(logging.file_line)
            .with_line_number(logging.file_line)
            .without_time()
            .boxed(),
        (LogFormat::Json, true) => tracing_subscriber::fmt::layer()
            .json()
            .with_file(logging.file_line)
            .with_line_number(logging.file_line)
            .with_current_span(logging.include_spans)
            .boxed(),
        (LogFormat::Json, false) => tracing_subscriber::fmt::layer()
            .json()
            .with_file(logging.file_line)
            .with_line_number(logging.file_line)
            .with_current_span(logging.include_spans)
            .without_time()
            .boxed(),
    }
}

/// Build the log filter.
///
/// `RUST_LOG` wins when set. Otherwise the configured level is combined with
/// the configured filter directives, or with defaults that quiet noisy crates.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let base_level = config.level.as_str();

    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else if let Some(filter) = &config.filter {
        let combined = format!("{},{}", base_level, filter);
        EnvFilter::try_new(combined).unwrap_or_else(|_| EnvFilter::new(base_level))
    } else {
        EnvFilter::new(format!(
            "{},hyper=warn,h2=warn,tower=info,sqlx=warn",
            base_level
        ))
    }
}

/// Tracing initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}
