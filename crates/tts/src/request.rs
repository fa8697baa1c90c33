use axum::body::Body;
use serde::de::DeserializeOwned;

use crate::error::TtsError;

/// JSON body extractor that rejects with [`TtsError`]
///
/// Every rejection carries the same error envelope as synthesis failures,
/// and missing or malformed fields are answered with `400` rather than
/// axum's default `422`.
pub struct JsonPayload<T>(pub T);

/// Body limit for speech requests (1 MiB)
const BODY_LIMIT_BYTES: usize = 1 << 20;

/// A missing Content-Type is read as JSON; anything else must be `application/json`
fn accepts_json(headers: &http::HeaderMap) -> bool {
    let Some(value) = headers.get(http::header::CONTENT_TYPE) else {
        return true;
    };

    value
        .to_str()
        .ok()
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

impl<S, T: DeserializeOwned> axum::extract::FromRequest<S> for JsonPayload<T>
where
    S: Send + Sync,
{
    type Rejection = TtsError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        if !accepts_json(&parts.headers) {
            return Err(TtsError::UnsupportedMediaType);
        }

        let bytes = axum::body::to_bytes(body, BODY_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                TtsError::PayloadTooLarge {
                    limit: BODY_LIMIT_BYTES,
                }
            } else {
                TtsError::InvalidRequest(format!("Failed to read request body: {err}"))
            }
        })?;

        serde_json::from_slice::<T>(&bytes).map(Self).map_err(|e| {
            tracing::debug!("rejected speech request body: {e}");
            TtsError::InvalidRequest(format!("Failed to parse request body: {e}"))
        })
    }
}
