use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::LoggingConfig;

/// Builds the filter directive string from the logging config.
///
/// The level comes first, noisy transport crates are capped at `warn`, and any
/// extra directives from the config are appended last so they win.
pub fn filter_directives(config: Option<&LoggingConfig>) -> String {
    let level = config
        .and_then(|l| l.level.as_deref())
        .unwrap_or("info");

    let filters = config
        .and_then(|l| l.filters.as_deref())
        .unwrap_or("");

    if filters.is_empty() {
        format!("{},tungstenite=warn,tokio_tungstenite=warn", level)
    } else {
        format!("{},tungstenite=warn,tokio_tungstenite=warn,{}", level, filters)
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the config.
///
/// Calling this more than once, or after the host bot installed its own
/// subscriber, leaves the existing subscriber in place.
pub fn init(config: Option<&LoggingConfig>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let ansi = config.and_then(|l| l.ansi).unwrap_or(true);
    let stdout_layer = fmt::layer()
        .event_format(LineFormatter::new(ansi))
        .with_ansi(ansi);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init();
}
