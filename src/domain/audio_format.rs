use std::fmt;

/// Container formats accepted for upload, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    M4a,
    Aac,
    Ogg,
    Opus,
    Webm,
}

const ACCEPTED_MIME_TYPES: &[&str] = &[
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
    "audio/vnd.wave",
    "audio/mpeg",
    "audio/mp3",
    "audio/flac",
    "audio/x-flac",
    "audio/mp4",
    "audio/m4a",
    "audio/x-m4a",
    "audio/aac",
    "audio/x-aac",
    "audio/ogg",
    "audio/opus",
    "audio/webm",
    "video/webm",
];

impl AudioFormat {
    pub const ALL: [AudioFormat; 8] = [
        AudioFormat::Wav,
        AudioFormat::Mp3,
        AudioFormat::Flac,
        AudioFormat::M4a,
        AudioFormat::Aac,
        AudioFormat::Ogg,
        AudioFormat::Opus,
        AudioFormat::Webm,
    ];

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "m4a" => Some(Self::M4a),
            "aac" => Some(Self::Aac),
            "ogg" => Some(Self::Ogg),
            "opus" => Some(Self::Opus),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, extension)| Self::from_extension(extension))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::Aac => "aac",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
            Self::Webm => "webm",
        }
    }

    /// MIME type assumed when the client did not declare one.
    pub fn inferred_mime(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Flac => "audio/flac",
            Self::M4a => "audio/mp4",
            Self::Aac => "audio/aac",
            Self::Ogg => "audio/ogg",
            Self::Opus => "audio/opus",
            Self::Webm => "audio/webm",
        }
    }

    /// Expects a MIME essence (lowercase, parameters stripped).
    pub fn is_accepted_mime(essence: &str) -> bool {
        ACCEPTED_MIME_TYPES.contains(&essence)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
