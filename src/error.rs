use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Everything the allocation and resolution paths can fail with.
///
/// All variants are recoverable and surface to clients as JSON error
/// messages; none are fatal to the process.
#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("invalid URL format at position {position}")]
    InvalidUrl { position: usize },

    #[error("invalid validity period at position {position}")]
    InvalidValidity { position: usize },

    #[error("a submission may contain at most {max} URLs")]
    TooManyUrls { max: usize },

    #[error("short code '{code}' is already taken")]
    CodeTaken { code: String },

    #[error("could not find a free short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },

    #[error("short code not found")]
    NotFound,

    #[error("short link has expired")]
    Expired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ShortenError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ShortenError::InvalidUrl { .. }
            | ShortenError::InvalidValidity { .. }
            | ShortenError::TooManyUrls { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            ShortenError::CodeTaken { .. } => (StatusCode::CONFLICT, self.to_string()),
            ShortenError::CodeSpaceExhausted { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ShortenError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ShortenError::Expired => (StatusCode::GONE, self.to_string()),
            ShortenError::Store(e) => {
                // Detail goes to the log, not the client
                tracing::error!("store failure: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal storage error".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
