use crate::{
    error::ShortenError,
    models::{LinkStatus, UrlRecord},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// A record plus its expiry state, computed against the clock at render time.
#[derive(Debug, Serialize)]
pub struct StatsEntry {
    #[serde(flatten)]
    pub record: UrlRecord,
    pub status: LinkStatus,
}

/// GET /api/links
///
/// Read-only listing of every record, including full click history.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StatsEntry>>, ShortenError> {
    let now = Utc::now();
    let records = state.shortener.list().await?;

    let entries = records
        .into_iter()
        .map(|record| {
            let status = record.status(now);
            StatsEntry { record, status }
        })
        .collect();

    Ok(Json(entries))
}

/// GET /api/links/:code
///
/// Non-mutating peek at a single record: same not-found / expired
/// classification as the redirect path, but no click is recorded. Display
/// surfaces use this so that rendering a link never counts as visiting it.
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<StatsEntry>, ShortenError> {
    let now = Utc::now();
    let record = state.shortener.peek(&code, now).await?;
    let status = record.status(now);

    Ok(Json(StatsEntry { record, status }))
}
