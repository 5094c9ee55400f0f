use crate::api::error::{ErrorResponse, PredictError};
use crate::api::temp_file::TempUpload;
use crate::genre::{FALLBACK_SOURCE, fallback_category};
use crate::{AppState, Genre};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Extension, Multipart};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

/// Body returned when the proxy computes the label itself.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct FallbackPrediction {
    pub genre: String,
    pub source: String,
}

impl FallbackPrediction {
    pub fn new(genre: Genre) -> Self {
        Self {
            genre: genre.to_string(),
            source: FALLBACK_SOURCE.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
}

pub async fn health(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            mode: state.mode().into(),
        }),
    )
}

/// `POST /api/predict`: spool the uploaded file, forward it to the model
/// endpoint or compute the fallback label, then drop the spooled copy.
pub async fn predict(
    Extension(state): Extension<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, PredictError> {
    // A request that is not multipart at all carries no file either
    let Ok(mut multipart) = multipart else {
        return Err(PredictError::NoFile);
    };

    let Some(upload) = TempUpload::receive(&mut multipart, state.uploads_dir()).await? else {
        return Err(PredictError::NoFile);
    };

    info!(file_name = %upload.original_name, size = upload.size, "Prediction requested");

    let result = relay(&state, &upload).await;
    upload.discard();
    result.map(Json)
}

async fn relay(state: &AppState, upload: &TempUpload) -> Result<Value, PredictError> {
    let Some(model) = &state.model else {
        let genre = fallback_category(&upload.original_name, upload.size);
        info!(file_name = %upload.original_name, %genre, "Fallback prediction");
        return Ok(json!(FallbackPrediction::new(genre)));
    };

    model.predict(upload).await.map_err(|error| {
        error!(url = model.url(), %error, "Model prediction failed");
        PredictError::Model(error)
    })
}

/// Unknown `/api/*` paths never fall through to the client bundle.
pub async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".into(),
            detail: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_prediction_shape() {
        let json = serde_json::to_value(FallbackPrediction::new(Genre::Pop)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "genre": "Pop", "source": "fallback" })
        );
    }
}
