use crate::domain::{AudioFormat, RejectionReason, SanitizedFilename, UploadedFile, ValidationVerdict};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Accepts or rejects an upload before any decoding work is done.
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_size_bytes: u64,
}

impl UploadValidator {
    pub fn new(max_size_bytes: u64) -> Self {
        Self { max_size_bytes }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Size gate usable while the body is still streaming in.
    pub fn check_size(&self, received_bytes: u64) -> Result<(), RejectionReason> {
        if received_bytes > self.max_size_bytes {
            Err(RejectionReason::TooLarge)
        } else {
            Ok(())
        }
    }

    pub fn validate(&self, file: &UploadedFile) -> ValidationVerdict {
        match self.check(file) {
            Ok((filename, format)) => ValidationVerdict::Accepted { filename, format },
            Err(reason) => {
                tracing::debug!(
                    filename = %file.filename,
                    bytes = file.size_bytes(),
                    reason = reason.code(),
                    "Upload rejected"
                );
                ValidationVerdict::Rejected(reason)
            }
        }
    }

    fn check(
        &self,
        file: &UploadedFile,
    ) -> Result<(SanitizedFilename, AudioFormat), RejectionReason> {
        if file.data.is_empty() {
            return Err(RejectionReason::EmptyFile);
        }

        self.check_size(file.size_bytes())?;

        let filename =
            SanitizedFilename::parse(&file.filename).ok_or(RejectionReason::UnsafeName)?;

        let format = filename
            .audio_format()
            .ok_or(RejectionReason::BadExtension)?;

        if let Some(mime) = file.declared_mime() {
            if !AudioFormat::is_accepted_mime(&mime) {
                return Err(RejectionReason::BadMime);
            }
        }

        Ok((filename, format))
    }
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}
