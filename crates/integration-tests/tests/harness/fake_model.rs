//! Deterministic in-process speech model for integration tests
//!
//! Every byte of the input text becomes one sample, so a response can be
//! traced back to the request that produced it.

use std::sync::atomic::{AtomicU32, Ordering};

use tts::{InferenceError, SpeechModel};

pub const SAMPLE_RATE: u32 = 32_000;

#[derive(Default)]
pub struct FakeModel {
    calls: AtomicU32,
    failure: Option<String>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model whose every inference fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failure: Some(message.to_owned()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Samples the fake model produces for `text`
pub fn expected_samples(text: &str) -> Vec<f32> {
    text.bytes().map(|b| (f32::from(b) - 128.0) / 128.0).collect()
}

impl SpeechModel for FakeModel {
    fn name(&self) -> &str {
        "fake-soprano"
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn infer(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.failure {
            Some(ref message) => Err(InferenceError::Failed(message.clone())),
            None => Ok(expected_samples(text)),
        }
    }
}
