use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {ENVIRONMENT_VAR} `{0}`, expected local, test or prod")]
pub struct UnknownEnvironment(pub String);

/// Deployment environment. Selects the optional
/// `config/appsettings.<name>.toml` overlay and is stamped on startup logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Test,
    Prod,
}

impl Environment {
    /// Reads `APP_ENVIRONMENT`; unset means `local`.
    pub fn from_env() -> Result<Self, UnknownEnvironment> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }

    pub fn settings_file(&self) -> String {
        format!("config/appsettings.{}", self.name())
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" | "development" => Ok(Self::Local),
            "test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err(UnknownEnvironment(value.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
