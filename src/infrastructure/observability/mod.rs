//! Logging setup and per-request correlation.

mod init_tracing;
mod request_id;
mod tracing_config;

pub use self::init_tracing::init_tracing;
pub use self::request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use self::tracing_config::TracingConfig;
