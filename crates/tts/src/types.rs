use serde::Deserialize;

use crate::format::AudioFormat;

const DEFAULT_MODEL: &str = "soprano-80m";
const DEFAULT_VOICE: &str = "default";
const DEFAULT_RESPONSE_FORMAT: &str = "wav";
const DEFAULT_SPEED: f64 = 1.0;

/// Speech synthesis request following `OpenAI` TTS API format
///
/// Optional fields accept both an omitted key and an explicit `null`.
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    /// Model identifier, advisory only
    #[serde(default)]
    pub model: Option<String>,
    /// Text to synthesize into speech
    pub input: String,
    /// Voice identifier, advisory only
    #[serde(default)]
    pub voice: Option<String>,
    /// Output audio format (wav, pcm; anything else falls back to wav)
    #[serde(default)]
    pub response_format: Option<String>,
    /// Speech speed multiplier, accepted but not applied
    #[serde(default)]
    pub speed: Option<f64>,
}

impl SpeechRequest {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn voice(&self) -> &str {
        self.voice.as_deref().unwrap_or(DEFAULT_VOICE)
    }

    /// Requested format, `wav` when missing or empty
    pub fn response_format(&self) -> &str {
        self.response_format
            .as_deref()
            .filter(|format| !format.is_empty())
            .unwrap_or(DEFAULT_RESPONSE_FORMAT)
    }

    pub fn speed(&self) -> f64 {
        self.speed.unwrap_or(DEFAULT_SPEED)
    }
}

/// Encoded audio ready to be returned to the client
#[derive(Debug)]
pub struct SpeechResponse {
    /// Encoded audio bytes
    pub audio: Vec<u8>,
    /// Container the bytes are encoded in
    pub format: AudioFormat,
    /// Format the client asked for when it was replaced by `format`
    pub substituted_for: Option<String>,
    /// Sample rate reported by the model
    pub sample_rate: u32,
    /// Number of mono samples in the audio
    pub sample_count: usize,
}

/// Header naming the requested format when it was replaced by WAV
pub const FORMAT_FALLBACK_HEADER: &str = "x-audio-format-fallback";
/// Header carrying the sample rate of the returned audio
pub const SAMPLE_RATE_HEADER: &str = "x-sample-rate";
/// Header carrying the duration of the returned audio in seconds
pub const AUDIO_DURATION_HEADER: &str = "x-audio-duration-secs";

impl SpeechResponse {
    /// Audio length in seconds
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f64 / f64::from(self.sample_rate)
    }

    /// Convert the speech response into an axum HTTP response
    pub fn into_response(self) -> axum::response::Response {
        let mut builder = axum::response::Response::builder()
            .header(http::header::CONTENT_TYPE, self.format.content_type())
            .header(SAMPLE_RATE_HEADER, self.sample_rate)
            .header(AUDIO_DURATION_HEADER, format!("{:.3}", self.duration_secs()));

        if let Some(requested) = self
            .substituted_for
            .as_deref()
            .and_then(|requested| http::HeaderValue::from_str(requested).ok())
        {
            builder = builder.header(FORMAT_FALLBACK_HEADER, requested);
        }

        builder
            .body(axum::body::Body::from(self.audio))
            .unwrap_or_else(|_| {
                let mut response = axum::response::Response::new(axum::body::Body::empty());
                *response.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            })
    }
}
