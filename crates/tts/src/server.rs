use std::{sync::Arc, time::Instant};

use soprano_telemetry::{
    Counter, Histogram, KeyValue,
    metrics::{self, TTS_AUDIO_DURATION, TTS_REQUEST_COUNT, TTS_REQUEST_DURATION},
};
use tokio::sync::Semaphore;

use crate::{
    encode,
    error::{Result, TtsError},
    format::{AudioFormat, ResolvedFormat},
    model::{self, SpeechModel},
    types::{SpeechRequest, SpeechResponse},
};

/// Speech synthesis state shared by every request
///
/// Holds the model loaded at startup, or nothing when loading failed.
pub struct Server {
    model: Option<Arc<dyn SpeechModel>>,
    permits: Option<Arc<Semaphore>>,
    metrics: SpeechMetrics,
}

impl Server {
    pub fn new(model: Option<Arc<dyn SpeechModel>>) -> Self {
        Self {
            model,
            permits: None,
            metrics: SpeechMetrics::new(),
        }
    }

    /// Cap the number of inference calls running at once; excess requests wait
    #[must_use]
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.permits = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    /// Whether a model was loaded at startup
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Synthesize the request's text and encode it in the resolved format
    pub async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse> {
        let start = Instant::now();
        let resolved = ResolvedFormat::resolve(request.response_format());
        let format = resolved.format;
        let fallback = resolved.substituted_for.is_some();

        let result = self.run(request, resolved).await;

        let status = match &result {
            Ok(_) => http::StatusCode::OK,
            Err(e) => e.status_code(),
        };
        self.metrics.record(start, format, fallback, status);

        if let Ok(ref response) = result {
            self.metrics.record_audio(response.duration_secs(), response.format);
        }

        result
    }

    async fn run(&self, request: SpeechRequest, resolved: ResolvedFormat) -> Result<SpeechResponse> {
        let Some(model) = self.model.as_ref().map(Arc::clone) else {
            return Err(TtsError::ModelUnavailable);
        };

        if request.input.is_empty() {
            return Err(TtsError::InvalidRequest("Input text is empty.".to_string()));
        }

        if (request.speed() - 1.0).abs() > f64::EPSILON {
            tracing::debug!(speed = request.speed(), "speed is not applied by this model");
        }

        let ResolvedFormat {
            format,
            substituted_for,
        } = resolved;

        if let Some(ref requested) = substituted_for {
            tracing::warn!(requested = %requested, "unsupported response format, answering with wav");
        }

        let _permit = match self.permits {
            Some(ref permits) => Some(
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .map_err(|_| TtsError::InternalError)?,
            ),
            None => None,
        };

        let sample_rate = model.sample_rate();
        let text = request.input;

        let (audio, sample_count) = tokio::task::spawn_blocking(move || render(model.as_ref(), &text, format))
            .await
            .map_err(|e| TtsError::SynthesisFailed(format!("synthesis task failed: {e}")))?
            .inspect_err(|e| tracing::error!("Error during synthesis: {e}"))?;

        tracing::debug!(bytes = audio.len(), sample_count, %format, "speech synthesis complete");

        Ok(SpeechResponse {
            audio,
            format,
            substituted_for,
            sample_rate,
            sample_count,
        })
    }
}

/// Run inference and encode the samples, on the blocking pool
fn render(model: &dyn SpeechModel, text: &str, format: AudioFormat) -> Result<(Vec<u8>, usize)> {
    let mut samples = model
        .infer(text)
        .map_err(|e| TtsError::SynthesisFailed(e.to_string()))?;

    encode::normalize(&mut samples);

    let audio = encode::encode(&samples, model.sample_rate(), format)
        .map_err(|e| TtsError::SynthesisFailed(e.to_string()))?;

    Ok((audio, samples.len()))
}

struct SpeechMetrics {
    request_duration: Histogram<f64>,
    request_count: Counter<u64>,
    audio_duration: Histogram<f64>,
}

impl SpeechMetrics {
    fn new() -> Self {
        let meter = metrics::meter();

        Self {
            request_duration: meter
                .f64_histogram(TTS_REQUEST_DURATION)
                .with_description("Time spent handling speech requests")
                .with_unit("s")
                .build(),
            request_count: meter
                .u64_counter(TTS_REQUEST_COUNT)
                .with_description("Speech requests handled")
                .build(),
            audio_duration: meter
                .f64_histogram(TTS_AUDIO_DURATION)
                .with_description("Length of synthesized audio")
                .with_unit("s")
                .build(),
        }
    }

    fn record(&self, start: Instant, format: AudioFormat, fallback: bool, status: http::StatusCode) {
        let attributes = request_attributes(format, fallback, status);

        metrics::record_duration(&self.request_duration, start, &attributes);
        self.request_count.add(1, &attributes);
    }

    fn record_audio(&self, duration_secs: f64, format: AudioFormat) {
        self.audio_duration
            .record(duration_secs, &[KeyValue::new("format", format.as_ref().to_string())]);
    }
}

/// Request metric attributes, bounded to the supported formats
fn request_attributes(format: AudioFormat, fallback: bool, status: http::StatusCode) -> [KeyValue; 3] {
    [
        KeyValue::new("format", format.as_ref().to_string()),
        KeyValue::new("fallback", fallback),
        KeyValue::new("status", i64::from(status.as_u16())),
    ]
}

/// Builder for constructing the TTS server from configuration
pub struct TtsServerBuilder<'a> {
    config: &'a soprano_config::Config,
}

impl<'a> TtsServerBuilder<'a> {
    pub const fn new(config: &'a soprano_config::Config) -> Self {
        Self { config }
    }

    /// Load the configured model
    ///
    /// Never fails: a missing or broken model is logged and the server
    /// answers synthesis requests with `503` instead.
    pub fn build(self) -> Server {
        let Some(ref model_config) = self.config.model else {
            tracing::warn!("no [model] configured, speech synthesis is unavailable");
            return Server::new(None);
        };

        tracing::info!(model = %model_config.name, "initializing speech model");

        let server = match model::load(model_config) {
            Ok(model) => {
                tracing::info!(
                    model = %model.name(),
                    sample_rate = model.sample_rate(),
                    "speech model initialized"
                );
                Server::new(Some(model))
            }
            Err(e) => {
                tracing::error!(model = %model_config.name, "failed to initialize speech model: {e}");
                Server::new(None)
            }
        };

        match model_config.max_concurrency {
            Some(limit) => server.with_max_concurrency(limit),
            None => server,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use soprano_config::{CommandModelConfig, Config, Device, ModelConfig, ModelType, SampleEncoding};

    use super::*;
    use crate::model::InferenceError;

    struct ConstantModel {
        samples: Vec<f32>,
    }

    impl SpeechModel for ConstantModel {
        fn name(&self) -> &str {
            "constant"
        }

        fn sample_rate(&self) -> u32 {
            32_000
        }

        fn infer(&self, _text: &str) -> std::result::Result<Vec<f32>, InferenceError> {
            Ok(self.samples.clone())
        }
    }

    struct FailingModel;

    impl SpeechModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn sample_rate(&self) -> u32 {
            32_000
        }

        fn infer(&self, _text: &str) -> std::result::Result<Vec<f32>, InferenceError> {
            Err(InferenceError::Failed("CUDA out of memory".to_string()))
        }
    }

    /// Tracks how many inferences overlap
    #[derive(Default)]
    struct SlowModel {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SpeechModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        fn sample_rate(&self) -> u32 {
            32_000
        }

        fn infer(&self, _text: &str) -> std::result::Result<Vec<f32>, InferenceError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![0.0; 8])
        }
    }

    fn request(input: &str, format: Option<&str>) -> SpeechRequest {
        SpeechRequest {
            model: None,
            input: input.to_string(),
            voice: None,
            response_format: format.map(str::to_string),
            speed: None,
        }
    }

    fn ready_server() -> Server {
        Server::new(Some(Arc::new(ConstantModel {
            samples: vec![0.0, 0.5, -0.5, 1.0],
        })))
    }

    #[tokio::test]
    async fn missing_model_is_unavailable() {
        let server = Server::new(None);
        assert!(!server.is_ready());

        let err = server.synthesize(request("Hello", None)).await.unwrap_err();
        assert!(matches!(err, TtsError::ModelUnavailable));
    }

    #[tokio::test]
    async fn missing_model_wins_over_empty_input() {
        let err = Server::new(None).synthesize(request("", None)).await.unwrap_err();
        assert!(matches!(err, TtsError::ModelUnavailable));
    }

    #[tokio::test]
    async fn empty_input_is_invalid() {
        let err = ready_server().synthesize(request("", None)).await.unwrap_err();
        assert!(matches!(err, TtsError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn wav_by_default() {
        let response = ready_server().synthesize(request("Hello", None)).await.unwrap();
        assert_eq!(response.format, AudioFormat::Wav);
        assert_eq!(response.sample_rate, 32_000);
        assert_eq!(response.sample_count, 4);
        assert_eq!(&response.audio[..4], b"RIFF");
        assert!(response.substituted_for.is_none());
    }

    #[tokio::test]
    async fn pcm_is_two_bytes_per_sample() {
        let response = ready_server().synthesize(request("Hello", Some("pcm"))).await.unwrap();
        assert_eq!(response.format, AudioFormat::Pcm);
        assert_eq!(response.audio.len(), 8);
    }

    #[tokio::test]
    async fn mp3_is_answered_with_wav() {
        let response = ready_server().synthesize(request("Hello", Some("mp3"))).await.unwrap();
        assert_eq!(response.format, AudioFormat::Wav);
        assert_eq!(response.substituted_for.as_deref(), Some("mp3"));
    }

    #[test]
    fn fallback_is_recorded_against_the_resolved_format() {
        let resolved = ResolvedFormat::resolve("Some-Client-Chosen-Format");
        let attributes = request_attributes(
            resolved.format,
            resolved.substituted_for.is_some(),
            http::StatusCode::OK,
        );

        assert_eq!(attributes[0], KeyValue::new("format", "wav"));
        assert_eq!(attributes[1], KeyValue::new("fallback", true));
        assert_eq!(attributes[2], KeyValue::new("status", 200_i64));
    }

    #[tokio::test]
    async fn inference_failure_carries_message() {
        let server = Server::new(Some(Arc::new(FailingModel)));
        let err = server.synthesize(request("Hello", None)).await.unwrap_err();

        let TtsError::SynthesisFailed(message) = err else {
            panic!("expected synthesis failure, got {err:?}");
        };
        assert_eq!(message, "CUDA out of memory");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_limit_serializes_inference() {
        let model = Arc::new(SlowModel::default());
        let server = Arc::new(Server::new(Some(Arc::clone(&model) as Arc<dyn SpeechModel>)).with_max_concurrency(1));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let server = Arc::clone(&server);
                tokio::spawn(async move { server.synthesize(request(&format!("text {i}"), None)).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(model.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn builder_without_model_section_is_not_ready() {
        let server = TtsServerBuilder::new(&Config::default()).build();
        assert!(!server.is_ready());
    }

    #[test]
    fn builder_fails_soft_on_load_error() {
        let config = Config {
            model: Some(ModelConfig {
                model_type: ModelType::Command,
                name: "soprano-80m".to_string(),
                sample_rate: 32_000,
                device: Device::Cpu,
                max_concurrency: None,
                command: Some(CommandModelConfig {
                    program: "soprano-synth-that-does-not-exist".to_string(),
                    args: Vec::new(),
                    model_path: None,
                    sample_encoding: SampleEncoding::S16le,
                }),
            }),
            ..Config::default()
        };

        let server = TtsServerBuilder::new(&config).build();
        assert!(!server.is_ready());
    }
}
