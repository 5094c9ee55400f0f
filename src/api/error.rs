use crate::api::temp_file::ReceiveError;
use crate::model::ModelError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON error body: `{"error": ..., "detail": ...}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Full error text attached to error responses for request logging.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid upload: {0}")]
    InvalidUpload(axum::extract::multipart::MultipartError),

    #[error("Failed to store upload: {0}")]
    Storage(std::io::Error),

    #[error("Prediction failed: {0}")]
    Model(#[from] ModelError),
}

impl From<ReceiveError> for PredictError {
    fn from(error: ReceiveError) -> Self {
        match error {
            ReceiveError::Multipart(error) => PredictError::InvalidUpload(error),
            ReceiveError::Io(error) => PredictError::Storage(error),
        }
    }
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::NoFile => StatusCode::BAD_REQUEST,
            PredictError::Unauthorized => StatusCode::UNAUTHORIZED,
            PredictError::InvalidUpload(error) => error.status(),
            PredictError::Storage(_) | PredictError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, detail) = match self {
            PredictError::NoFile => ("No file uploaded", None),
            PredictError::Unauthorized => ("Unauthorized", None),
            PredictError::InvalidUpload(error) => ("Invalid upload", Some(error.body_text())),
            PredictError::Storage(error) => ("Prediction failed", Some(error.to_string())),
            PredictError::Model(error) => ("Prediction failed", Some(error.to_string())),
        };

        ErrorResponse {
            error: error.to_string(),
            detail,
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let detail = ErrorDetail(self.to_string());
        let mut response = (self.status(), Json(self.body())).into_response();
        response.extensions_mut().insert(detail);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_body() {
        let error = PredictError::NoFile;
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        let json = serde_json::to_value(error.body()).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "No file uploaded" }));
    }

    #[test]
    fn test_unauthorized_body() {
        let error = PredictError::Unauthorized;
        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error.body().error, "Unauthorized");
    }

    #[test]
    fn test_model_error_carries_detail() {
        let error = PredictError::from(ModelError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        });
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = error.body();
        assert_eq!(body.error, "Prediction failed");
        let detail = body.detail.unwrap();
        assert!(detail.contains("502"), "{detail}");
        assert!(detail.contains("upstream down"), "{detail}");
    }

    #[test]
    fn test_response_carries_detail_for_logging() {
        let response = PredictError::from(ModelError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert!(detail.0.starts_with("Prediction failed"), "{}", detail.0);
        assert!(detail.0.contains("upstream down"), "{}", detail.0);
    }

    #[test]
    fn test_storage_error_is_server_error() {
        let error = PredictError::from(ReceiveError::Io(std::io::Error::other("disk full")));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.body().error, "Prediction failed");
    }
}
