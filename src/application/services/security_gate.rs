use sha2::{Digest, Sha256};

/// Paths served without an API key so probes work unauthenticated.
pub const PUBLIC_PATHS: &[&str] = &["/", "/health"];

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:8002", "http://127.0.0.1:8002"];

const ANY_ORIGIN: &str = "*";

/// API-key and origin policy, evaluated before a request body is read.
///
/// With no key configured every request is let through. That posture is
/// intended for local development and is logged at startup.
pub struct SecurityGate {
    api_key_digest: Option<[u8; 32]>,
    allowed_origins: Vec<String>,
    strict_origin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SecurityError {
    #[error("missing API key")]
    MissingCredentials,
    #[error("invalid API key")]
    InvalidCredentials,
    #[error("origin not allowed")]
    OriginNotAllowed,
}

impl SecurityGate {
    pub fn new(api_key: Option<String>, allowed_origins: Vec<String>, strict_origin: bool) -> Self {
        let api_key_digest = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(|key| digest(key.as_bytes()));

        let allowed_origins = allowed_origins
            .into_iter()
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            api_key_digest,
            allowed_origins,
            strict_origin,
        }
    }

    /// No key, local origins only.
    pub fn open() -> Self {
        Self::new(
            None,
            DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
            false,
        )
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_digest.is_some()
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }

    pub fn is_public_path(path: &str) -> bool {
        PUBLIC_PATHS.contains(&path)
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allows_any_origin() || self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    /// Absent origins always pass. Foreign origins fail only in strict mode;
    /// otherwise they are merely denied CORS headers.
    pub fn check_origin(&self, origin: Option<&str>) -> Result<(), SecurityError> {
        match origin {
            Some(origin) if self.strict_origin && !self.is_origin_allowed(origin) => {
                Err(SecurityError::OriginNotAllowed)
            }
            _ => Ok(()),
        }
    }

    /// Accepts the key from either `Authorization: Bearer <key>` or
    /// `X-API-Key: <key>`.
    pub fn authorize(
        &self,
        path: &str,
        authorization: Option<&str>,
        x_api_key: Option<&str>,
    ) -> Result<(), SecurityError> {
        let Some(expected) = &self.api_key_digest else {
            return Ok(());
        };
        if Self::is_public_path(path) {
            return Ok(());
        }

        let presented: Vec<&str> = [authorization.and_then(bearer_token), x_api_key]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();

        if presented.is_empty() {
            return Err(SecurityError::MissingCredentials);
        }

        // Every candidate is compared so timing does not reveal which header matched.
        let matched = presented
            .iter()
            .fold(false, |acc, key| acc | constant_time_eq(&digest(key.as_bytes()), expected));

        if matched {
            Ok(())
        } else {
            Err(SecurityError::InvalidCredentials)
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Keys are hashed first, so both sides always have the same length.
fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
