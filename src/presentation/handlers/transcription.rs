use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use bytes::BytesMut;

use crate::application::services::UploadValidator;
use crate::domain::{AssembledResponse, ResponseFormat, TranscriptionOptions, UploadedFile};
use crate::presentation::state::AppState;

use super::api_error::ApiError;
use super::openai_types::TranscriptionJson;

/// Slack for multipart boundaries and the small text fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[derive(Default)]
struct TranscriptionForm {
    file: Option<UploadedFile>,
    model: Option<String>,
    language: Option<String>,
    response_format: Option<String>,
    recording_timestamp: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn transcription_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let validator = state.pipeline.validator();
    reject_oversized_body(validator, &headers)?;

    let form = read_form(multipart, validator).await?;
    let upload = form.file.ok_or(ApiError::MissingFile)?;

    let response_format = match form.response_format.as_deref() {
        None => ResponseFormat::default(),
        Some(raw) => raw
            .parse::<ResponseFormat>()
            .map_err(|_| ApiError::UnsupportedResponseFormat(raw.to_string()))?,
    };

    let options = TranscriptionOptions {
        language: form
            .language
            .filter(|language| !language.is_empty())
            .unwrap_or_else(|| state.default_language.clone()),
        response_format,
        model: form.model.filter(|model| !model.is_empty()),
        recording_timestamp: form.recording_timestamp,
    };

    tracing::debug!(
        filename = %upload.filename,
        bytes = upload.size_bytes(),
        language = %options.language,
        response_format = %options.response_format,
        "Transcription request received"
    );

    let response = match state.pipeline.process(upload, options).await? {
        AssembledResponse::Json(body) => Json(TranscriptionJson::from(body)).into_response(),
        AssembledResponse::Text(text) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
    };

    Ok(response)
}

/// Cheap early exit when the client announces a body that cannot fit.
fn reject_oversized_body(validator: &UploadValidator, headers: &HeaderMap) -> Result<(), ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    if let Some(length) = declared {
        validator.check_size(length.saturating_sub(MULTIPART_OVERHEAD_BYTES))?;
    }
    Ok(())
}

async fn read_form(
    mut multipart: Multipart,
    validator: &UploadValidator,
) -> Result<TranscriptionForm, ApiError> {
    let mut form = TranscriptionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::MalformedUpload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => form.file = Some(read_file(field, validator).await?),
            "model" => form.model = Some(read_text(field).await?),
            "language" => form.language = Some(read_text(field).await?),
            "response_format" => form.response_format = Some(read_text(field).await?),
            "recording_timestamp" => form.recording_timestamp = Some(read_text(field).await?),
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

/// Streams the file part, enforcing the size ceiling per chunk so an
/// oversized body is never fully buffered.
async fn read_file(
    mut field: Field<'_>,
    validator: &UploadValidator,
) -> Result<UploadedFile, ApiError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut data = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::MalformedUpload(e.to_string()))?
    {
        validator.check_size((data.len() + chunk.len()) as u64)?;
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile::new(data.freeze(), filename, content_type))
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map(|value| value.trim().to_string())
        .map_err(|e| ApiError::MalformedUpload(e.to_string()))
}
