use config::{Config, ConfigError, Environment as EnvironmentSource, File};
use serde::Deserialize;

use crate::infrastructure::audio::ModelProvider;

use super::environment::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub security: SecuritySettings,
    pub upload: UploadSettings,
    pub model: ModelSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySettings {
    #[serde(default)]
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub strict_origin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    pub max_file_size_mb: u64,
    #[serde(default)]
    pub temp_dir: Option<String>,
}

impl UploadSettings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    pub model_id: String,
    #[serde(default)]
    pub checksum_sha256: Option<String>,
    pub preload: bool,
    #[serde(default)]
    pub inference_timeout_secs: Option<u64>,
    pub default_language: String,
    #[serde(default)]
    pub remote_base_url: Option<String>,
    #[serde(default)]
    pub remote_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Defaults, then `config/appsettings.<env>.toml`, then `APP_*`
    /// variables (`APP_SECURITY__API_KEY`, `APP_SERVER__PORT`, ...).
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8002)?
            .set_default(
                "security.cors_origins",
                vec!["http://localhost:8002", "http://127.0.0.1:8002"],
            )?
            .set_default("security.strict_origin", false)?
            .set_default("upload.max_file_size_mb", 100)?
            .set_default("model.provider", "local")?
            .set_default("model.model_id", "openai/whisper-base")?
            .set_default("model.preload", true)?
            .set_default("model.default_language", "de")?
            .set_default("logging.level", "info")?
            .set_default("logging.enable_json", false)?
            .add_source(
                File::with_name(&environment.settings_file()).required(false),
            )
            .add_source(
                EnvironmentSource::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
