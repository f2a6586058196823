use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use super::TracingConfig;

/// Install the global subscriber: JSON lines in production setups, human
/// readable output otherwise. `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: TracingConfig, port: u16) {
    let (env_filter, filter_source) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, "RUST_LOG"),
        Err(_) => (EnvFilter::new(config.default_filter()), "settings"),
    };

    let json_layer = config.json_format.then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(true)
    });
    let plain_layer = (!config.json_format).then(|| {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .init();

    tracing::info!(
        port = port,
        environment = %config.environment,
        level = %config.level,
        filter_source = filter_source,
        json_format = config.json_format,
        "Transcription gateway initialized"
    );
}
