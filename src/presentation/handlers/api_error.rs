use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::services::{PipelineError, SecurityError};
use crate::domain::RejectionReason;

use super::openai_types::{ErrorBody, ErrorDetail};

/// Every failure a client can see. Maps to a stable code and status;
/// internal detail goes to the log only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error("multipart field `file` is required")]
    MissingFile,
    #[error("malformed multipart upload: {0}")]
    MalformedUpload(String),
    #[error("unsupported response_format: {0}")]
    UnsupportedResponseFormat(String),
}

impl From<RejectionReason> for ApiError {
    fn from(reason: RejectionReason) -> Self {
        Self::Pipeline(PipelineError::Validation(reason))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(error) => match error {
                PipelineError::Validation(reason) => match reason {
                    RejectionReason::EmptyFile | RejectionReason::UnsafeName => {
                        StatusCode::BAD_REQUEST
                    }
                    RejectionReason::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
                    RejectionReason::BadExtension | RejectionReason::BadMime => {
                        StatusCode::UNSUPPORTED_MEDIA_TYPE
                    }
                },
                PipelineError::Decode(error) if error.is_server_fault() => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                PipelineError::Decode(_) => StatusCode::BAD_REQUEST,
                PipelineError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PipelineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            },
            ApiError::Security(SecurityError::OriginNotAllowed) => StatusCode::FORBIDDEN,
            ApiError::Security(_) => StatusCode::UNAUTHORIZED,
            ApiError::MissingFile
            | ApiError::MalformedUpload(_)
            | ApiError::UnsupportedResponseFormat(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Pipeline(error) => match error {
                PipelineError::Validation(reason) => reason.code(),
                PipelineError::Decode(error) if error.is_server_fault() => "audio-staging-failed",
                PipelineError::Decode(_) => "decode-error",
                PipelineError::ModelLoad(_) => "model-unavailable",
                PipelineError::Inference(_) => "inference-error",
                PipelineError::Timeout(_) => "timeout",
            },
            ApiError::Security(SecurityError::OriginNotAllowed) => "origin-not-allowed",
            ApiError::Security(_) => "authentication-failed",
            ApiError::MissingFile => "missing-file",
            ApiError::MalformedUpload(_) => "malformed-upload",
            ApiError::UnsupportedResponseFormat(_) => "unsupported-response-format",
        }
    }

    /// Client-safe message. Never includes backend or decoder internals.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Pipeline(error) => match error {
                PipelineError::Validation(reason) => reason.to_string(),
                PipelineError::Decode(error) if error.is_server_fault() => {
                    "audio could not be prepared for decoding".to_string()
                }
                PipelineError::Decode(_) => "audio could not be decoded".to_string(),
                PipelineError::ModelLoad(_) => "speech model is not available".to_string(),
                PipelineError::Inference(_) => "transcription failed".to_string(),
                PipelineError::Timeout(_) => "transcription timed out".to_string(),
            },
            ApiError::Security(error) => error.to_string(),
            ApiError::MissingFile => self.to_string(),
            ApiError::MalformedUpload(_) => "malformed multipart upload".to_string(),
            ApiError::UnsupportedResponseFormat(value) => format!(
                "unsupported response_format `{}`, expected `json` or `text`",
                value
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(code = code, error = %self, "Request failed");
        } else {
            tracing::warn!(code = code, error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message: self.client_message(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
