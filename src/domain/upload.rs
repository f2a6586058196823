use std::fmt;

use bytes::Bytes;

use super::audio_format::AudioFormat;

const MAX_FILENAME_BYTES: usize = 255;
const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// A multipart upload as received from the client. Owned by one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Bytes,
    pub filename: String,
    pub content_type: Option<String>,
}

impl UploadedFile {
    pub fn new(data: Bytes, filename: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            data,
            filename: filename.into(),
            content_type,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Declared MIME essence, lowercased and without parameters.
    ///
    /// Generic binary types are treated like an absent header, since many
    /// clients send them for every file.
    pub fn declared_mime(&self) -> Option<String> {
        let raw = self.content_type.as_deref()?;
        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.is_empty() || GENERIC_MIME_TYPES.contains(&essence.as_str()) {
            None
        } else {
            Some(essence)
        }
    }
}

/// Client filename reduced to a single safe path component.
///
/// Directory parts are discarded, runs of dots collapse to one, and every
/// character outside letters, digits, space, `-`, `_` and `.` becomes `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedFilename(String);

impl SanitizedFilename {
    pub fn parse(raw: &str) -> Option<Self> {
        let base = raw.rsplit(['/', '\\']).next().unwrap_or("");

        let mut cleaned = String::with_capacity(base.len());
        let mut prev_was_dot = false;

        for ch in base.chars() {
            if ch.is_control() {
                continue;
            }
            let ch = if ch.is_alphanumeric() || matches!(ch, '-' | '_' | ' ' | '.') {
                ch
            } else {
                '_'
            };
            if ch == '.' {
                if prev_was_dot {
                    continue;
                }
                prev_was_dot = true;
            } else {
                prev_was_dot = false;
            }
            cleaned.push(ch);
        }

        let cleaned = cleaned.trim().trim_start_matches('.').trim();
        if cleaned.is_empty() || cleaned.len() > MAX_FILENAME_BYTES {
            return None;
        }

        Some(Self(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(_, extension)| extension)
    }

    pub fn audio_format(&self) -> Option<AudioFormat> {
        self.extension().and_then(AudioFormat::from_extension)
    }
}

impl fmt::Display for SanitizedFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RejectionReason {
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error("uploaded file exceeds the size limit")]
    TooLarge,
    #[error("file extension is not an accepted audio format")]
    BadExtension,
    #[error("declared content type is not an accepted audio type")]
    BadMime,
    #[error("filename cannot be used safely")]
    UnsafeName,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyFile => "empty-file",
            Self::TooLarge => "too-large",
            Self::BadExtension => "bad-extension",
            Self::BadMime => "bad-mime",
            Self::UnsafeName => "unsafe-name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    Accepted {
        filename: SanitizedFilename,
        format: AudioFormat,
    },
    Rejected(RejectionReason),
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    pub fn into_result(self) -> Result<(SanitizedFilename, AudioFormat), RejectionReason> {
        match self {
            Self::Accepted { filename, format } => Ok((filename, format)),
            Self::Rejected(reason) => Err(reason),
        }
    }
}
