use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use yt_extractor::ErrorExtractor;
use ytdl_rust::ErrorBody;

#[derive(Debug)]
pub enum ApiError {
    MissingParameter(&'static str),
    InvalidParameter(String),
    NotFound { error: &'static str, message: String },
    /// `context` says what the request was doing
    Extractor {
        context: &'static str,
        source: ErrorExtractor,
    },
}

impl ApiError {
    pub fn extractor(context: &'static str) -> impl FnOnce(ErrorExtractor) -> Self {
        move |source| ApiError::Extractor { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                format!("Query parameter \"{name}\" is required"),
                format!("Missing required query parameter {name}"),
            ),
            ApiError::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid parameter".to_string(), msg)
            }
            ApiError::NotFound { error, message } => {
                (StatusCode::NOT_FOUND, error.to_string(), message)
            }
            ApiError::Extractor {
                context,
                source: source @ ErrorExtractor::NoFormatFound(_),
            } => (StatusCode::NOT_FOUND, source.to_string(), format!("{context} : {source}")),
            ApiError::Extractor { context, source } => {
                tracing::error!("{context} : {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    context.to_string(),
                    source.to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}
