mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VAR, Environment, UnknownEnvironment};
pub use settings::{
    LoggingSettings, ModelSettings, SecuritySettings, ServerSettings, Settings,
    UploadSettings,
};
