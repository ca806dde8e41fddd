use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ghostwriter_llm::UpstreamError;
use serde_json::json;
use tracing::error;

/// Shown to callers whenever an answer could not be produced. Says nothing
/// about what sits behind the endpoint.
pub const UNAVAILABLE_MESSAGE: &str = "Sorry, I can't answer that right now. Try again in a bit.";

#[derive(Debug)]
pub enum ApiError {
    Upstream(UpstreamError),
}

impl From<UpstreamError> for ApiError {
    fn from(error: UpstreamError) -> Self {
        Self::Upstream(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Upstream(err) => {
                error!(error = %err, upstream_status = ?err.status(), "completion failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": UNAVAILABLE_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}
