use crate::presentation::config::{Environment, LoggingSettings};

/// Configuration for tracing initialization.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub level: String,
}

impl TracingConfig {
    pub fn from_settings(logging: &LoggingSettings, environment: Environment) -> Self {
        Self {
            environment: environment.to_string(),
            json_format: logging.enable_json,
            level: logging.level.clone(),
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> String {
        format!(
            "{},parakeet_gateway=debug,tower_http=debug",
            self.level.trim().to_lowercase()
        )
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local.to_string(),
            json_format: false,
            level: "info".to_string(),
        }
    }
}
