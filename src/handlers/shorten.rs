use crate::{error::ShortenError, models::ShortenRequest, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

/// POST /api/shorten
///
/// Accepts a JSON array of up to five `{longUrl, validityMinutes?,
/// customCode?}` entries, allocates the whole submission against one store
/// snapshot, and returns the created records.
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    Json(requests): Json<Vec<ShortenRequest>>,
) -> Result<impl IntoResponse, ShortenError> {
    let records = state.shortener.shorten_batch(&requests, Utc::now()).await?;

    tracing::info!("shortened {} URL(s)", records.len());
    Ok((StatusCode::CREATED, Json(records)))
}
