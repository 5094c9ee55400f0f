pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod genre;
pub mod model;
pub mod upload;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Extension};
use axum::routing::{any, get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

//
// Re-export
//
pub use api::{FallbackPrediction, PredictError, api_key_middleware, log_request_errors, predict};
pub use app_state::AppState;
pub use client::{Classification, PredictClient};
pub use config::Config;
pub use genre::{CATEGORIES, Genre, fallback_category};
pub use model::{ModelClient, ModelError};
pub use upload::{ACCEPTED_MEDIA_TYPES, MAX_UPLOAD_BYTES, UploadCandidate, ValidationError};

/// Build the HTTP router for the given configuration and state.
pub fn router(config: &Config, state: AppState) -> Router {
    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let predict_route = Router::new()
        .route("/api/predict", post(predict))
        .route_layer(axum::middleware::from_fn_with_state(
            state.api_key.clone(),
            api_key_middleware,
        ));

    let mut app = Router::new()
        .merge(predict_route)
        .route("/api/health", get(api::health))
        .route("/api/{*path}", any(api::api_not_found));

    // Serve the client bundle with an index.html fallback for client-side routes
    let static_dir = config.static_path();
    if static_dir.is_dir() {
        info!(static_dir = %static_dir.display(), "Serving client bundle");
        let index = ServeFile::new(static_dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(&static_dir).fallback(index));
    }

    app.layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(axum::middleware::from_fn(log_request_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    let app = router(&config, state);

    let addr = format!("0.0.0.0:{}", config.listen_on_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
