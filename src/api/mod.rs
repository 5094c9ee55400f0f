pub mod error;
pub mod middleware;
pub mod routes;
pub mod temp_file;

// Re-export public types and functions
pub use error::{ErrorResponse, PredictError};
pub use middleware::{API_KEY_HEADER, api_key_middleware, log_request_errors};
pub use routes::{FallbackPrediction, api_not_found, health, predict};
pub use temp_file::{FILE_FIELD, TempUpload};
