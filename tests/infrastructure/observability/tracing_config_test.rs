use parakeet_gateway::infrastructure::observability::TracingConfig;
use parakeet_gateway::presentation::Environment;
use parakeet_gateway::presentation::config::LoggingSettings;

#[test]
fn given_default_config_when_created_then_plain_info_logging() {
    let config = TracingConfig::default();
    assert!(!config.json_format);
    assert_eq!(config.level, "info");
    assert!(!config.environment.is_empty());
}

#[test]
fn given_logging_settings_when_converting_then_values_carry_over() {
    let logging = LoggingSettings {
        level: "WARN".to_string(),
        enable_json: true,
    };

    let config = TracingConfig::from_settings(&logging, Environment::Prod);

    assert!(config.json_format);
    assert_eq!(config.environment, "prod");
    assert!(config.default_filter().starts_with("warn,"));
    assert!(config.default_filter().contains("parakeet_gateway=debug"));
}
