use std::sync::Arc;

use crate::application::services::{SecurityGate, TranscriptionPipeline};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TranscriptionPipeline>,
    pub security: Arc<SecurityGate>,
    pub default_language: String,
}
