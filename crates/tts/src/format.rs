use strum::{AsRefStr, Display, EnumString};

/// Containers the gateway can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AudioFormat {
    /// 16-bit PCM mono WAV
    Wav,
    /// Headerless 16-bit little-endian mono samples
    Pcm,
}

impl AudioFormat {
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Pcm => "audio/pcm",
        }
    }
}

/// Outcome of mapping a requested `response_format` onto a supported container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormat {
    pub format: AudioFormat,
    /// The requested value when it was replaced by the WAV fallback
    pub substituted_for: Option<String>,
}

impl ResolvedFormat {
    /// Resolve a requested format name
    ///
    /// `mp3` and every unrecognized name fall back to WAV. Callers surface
    /// `substituted_for` so clients can tell the output differs from what
    /// they asked for.
    pub fn resolve(requested: &str) -> Self {
        match requested.trim().parse::<AudioFormat>() {
            Ok(format) => Self {
                format,
                substituted_for: None,
            },
            Err(_) => Self {
                format: AudioFormat::Wav,
                substituted_for: Some(requested.to_string()),
            },
        }
    }
}
