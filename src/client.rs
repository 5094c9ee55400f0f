use crate::api::{API_KEY_HEADER, FILE_FIELD};
use crate::genre::{FALLBACK_SOURCE, fallback_category};
use crate::upload::{UploadCandidate, ValidationError};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/predict";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// What the user gets to see for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub genre: String,
    pub source: Option<String>,
    /// Set when the prediction request failed and the label is a local fallback.
    pub error: Option<String>,
}

impl Classification {
    pub fn fallback(candidate: &UploadCandidate, error: Option<String>) -> Self {
        Self {
            genre: fallback_category(&candidate.name, candidate.size()).to_string(),
            source: Some(FALLBACK_SOURCE.to_string()),
            error,
        }
    }

    /// Use the server's `genre`/`source` when present, the local fallback otherwise.
    pub fn from_response(body: &Value, candidate: &UploadCandidate) -> Self {
        let non_empty = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        match non_empty("genre") {
            Some(genre) => Self {
                genre,
                source: non_empty("source"),
                error: None,
            },
            None => Self::fallback(candidate, None),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source.as_deref() == Some(FALLBACK_SOURCE)
    }

    /// `"Rock"`, `"Rock (proxy)"`, `"Pop (fallback)"`.
    pub fn label(&self) -> String {
        match &self.source {
            Some(source) => format!("{} ({source})", self.genre),
            None => self.genre.clone(),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Uploads audio files to a prediction endpoint.
#[derive(Clone, Debug)]
pub struct PredictClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PredictClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Validate, submit, and turn the outcome into a label.
    ///
    /// Only validation errors are returned; nothing is sent for an invalid
    /// candidate. Every request failure degrades to the fallback label with
    /// [`Classification::error`] set.
    pub async fn classify(
        &self,
        candidate: &UploadCandidate,
    ) -> Result<Classification, ValidationError> {
        candidate.validate()?;

        match self.submit(candidate).await {
            Ok(body) => Ok(Classification::from_response(&body, candidate)),
            Err(error) => {
                warn!(endpoint = %self.endpoint, %error, "Prediction failed, using fallback label");
                Ok(Classification::fallback(
                    candidate,
                    Some(format!("Prediction failed. {error}")),
                ))
            }
        }
    }

    async fn submit(&self, candidate: &UploadCandidate) -> Result<Value, reqwest::Error> {
        let part = Part::stream_with_length(candidate.bytes.clone(), candidate.size())
            .file_name(candidate.name.clone())
            .mime_str(&candidate.media_type)?;
        let form = Form::new().part(FILE_FIELD, part);

        let mut request = self.http_client.post(&self.endpoint).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        debug!(endpoint = %self.endpoint, file_name = %candidate.name, size = candidate.size(), "Submitting upload");

        let response = request.send().await?.error_for_status()?;
        response.json::<Value>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> UploadCandidate {
        UploadCandidate::new("test.wav", "audio/wav", vec![0u8; 4])
    }

    #[test]
    fn test_label_with_source() {
        let classification = Classification::from_response(
            &json!({ "genre": "Rock", "source": "model" }),
            &candidate(),
        );
        assert_eq!(classification.label(), "Rock (model)");
        assert!(classification.error.is_none());
    }

    #[test]
    fn test_label_without_source() {
        let classification = Classification::from_response(&json!({ "genre": "Jazz" }), &candidate());
        assert_eq!(classification.label(), "Jazz");
    }

    #[test]
    fn test_missing_genre_uses_fallback() {
        for body in [json!({}), json!({ "genre": "" }), json!({ "genre": 3 }), json!("Rock")] {
            let classification = Classification::from_response(&body, &candidate());
            assert_eq!(classification.label(), "Pop (fallback)", "{body}");
            assert!(classification.is_fallback());
            assert!(classification.error.is_none());
        }
    }

    #[tokio::test]
    async fn test_invalid_candidate_is_not_sent() {
        // Nothing listens on port 9; a request would fail and fall back
        let client = PredictClient::new("http://127.0.0.1:9/api/predict", None, DEFAULT_TIMEOUT).unwrap();
        let ogg = UploadCandidate::new("song.ogg", "audio/ogg", vec![0u8; 4]);

        let err = client.classify(&ogg).await.unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let port = portpicker::pick_unused_port().expect("No available port");
        let client = PredictClient::new(
            format!("http://127.0.0.1:{port}/api/predict"),
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let classification = client.classify(&candidate()).await.unwrap();
        assert_eq!(classification.label(), "Pop (fallback)");
        assert!(classification.error.unwrap().starts_with("Prediction failed."));
    }
}
