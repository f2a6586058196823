mod model_session;
mod response_assembler;
mod security_gate;
mod transcript_cleaner;
mod transcription_pipeline;
mod upload_validator;

pub use model_session::ModelSession;
pub use response_assembler::{ResponseAssembler, clean_segments, validate_timeline};
pub use security_gate::{DEFAULT_ALLOWED_ORIGINS, PUBLIC_PATHS, SecurityError, SecurityGate};
pub use transcript_cleaner::clean_transcript_text;
pub use transcription_pipeline::{PipelineError, TranscriptionPipeline};
pub use upload_validator::{DEFAULT_MAX_UPLOAD_BYTES, UploadValidator};
