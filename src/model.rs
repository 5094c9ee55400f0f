use crate::api::temp_file::{FILE_FIELD, TempUpload};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Model returned invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Client for the external model endpoint the proxy forwards uploads to.
#[derive(Clone, Debug)]
pub struct ModelClient {
    http_client: reqwest::Client,
    url: String,
}

impl ModelClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Re-encode the upload as multipart and forward it. The upstream body is
    /// returned as opaque JSON; its shape is owned by the model service.
    pub async fn predict(&self, upload: &TempUpload) -> Result<serde_json::Value, ModelError> {
        let file = tokio::fs::File::open(&upload.path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let content_type = upload.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&upload.original_name)
                .first_or_octet_stream()
                .to_string()
        });
        let part = Part::stream_with_length(body, upload.size)
            .file_name(upload.original_name.clone())
            .mime_str(&content_type)?;
        let form = Form::new().part(FILE_FIELD, part);

        debug!(url = %self.url, file_name = %upload.original_name, size = upload.size, "Forwarding upload to model");

        let response = self.http_client.post(&self.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => format!("<unreadable body: {error}>"),
            };
            return Err(ModelError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let prediction =
            serde_json::from_slice::<serde_json::Value>(&bytes).map_err(ModelError::Decode)?;

        info!(url = %self.url, %status, "Model prediction received");
        Ok(prediction)
    }
}
