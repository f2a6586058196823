use parakeet_gateway::infrastructure::audio::ModelProvider;
use parakeet_gateway::presentation::config::{Environment, Settings, UnknownEnvironment};

#[test]
fn given_environment_aliases_when_parsing_then_resolved() {
    assert_eq!("development".parse(), Ok(Environment::Local));
    assert_eq!(" PRODUCTION ".parse(), Ok(Environment::Prod));
    assert_eq!(
        "staging".parse::<Environment>(),
        Err(UnknownEnvironment("staging".to_string()))
    );
}

#[test]
fn given_environments_when_locating_config_file_then_lowercase_name() {
    assert_eq!(Environment::Local.settings_file(), "config/appsettings.local");
    assert_eq!(Environment::Test.settings_file(), "config/appsettings.test");
    assert_eq!(Environment::Prod.to_string(), "prod");
}

#[test]
fn given_no_overrides_when_loading_settings_then_defaults_apply() {
    let settings = Settings::load(Environment::Test).unwrap();

    assert_eq!(settings.server.port, 8002);
    assert_eq!(settings.model.provider, ModelProvider::Local);
    assert_eq!(settings.model.default_language, "de");
    assert!(settings.model.preload);
    assert!(!settings.security.strict_origin);
    assert_eq!(
        settings.security.cors_origins,
        vec!["http://localhost:8002", "http://127.0.0.1:8002"]
    );
    assert_eq!(settings.upload.max_file_size_bytes(), 100 * 1024 * 1024);
}
