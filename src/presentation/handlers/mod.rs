mod api_error;
mod health;
pub mod openai_types;
mod root;
mod transcription;

pub use api_error::ApiError;
pub use health::{HealthResponse, health_handler};
pub use root::{RootResponse, root_handler};
pub use transcription::transcription_handler;
