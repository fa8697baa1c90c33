//! Metric name constants and recording helpers

use std::time::Instant;

use opentelemetry::metrics::{Histogram, Meter};

/// Instrumentation scope shared by every crate in the gateway
pub const METER_NAME: &str = "soprano";

/// Meter from the globally installed provider
///
/// Instruments created from it are no-ops until [`crate::init`] installs an
/// exporting provider.
pub fn meter() -> Meter {
    opentelemetry::global::meter(METER_NAME)
}

/// Record a duration measurement on a histogram
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[opentelemetry::KeyValue]) {
    let duration = start.elapsed().as_secs_f64();
    histogram.record(duration, attributes);
}

// Speech metric names
pub const TTS_REQUEST_DURATION: &str = "tts.request.duration";
pub const TTS_REQUEST_COUNT: &str = "tts.request.count";
pub const TTS_AUDIO_DURATION: &str = "tts.audio.duration";
