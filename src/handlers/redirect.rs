use crate::{error::ShortenError, geo, models::ClickContext, AppState};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc};

/// GET /:code
///
/// 1. Gather the click context: referrer (or "Direct") and a best-effort
///    location for the client IP (cached, strict timeout, private ranges
///    skipped).
/// 2. Resolve the code through the mutating visit path — on success this
///    records the click and persists the collection.
/// 3. Redirect the browser to the original URL, or render the terminal
///    not-found / expired outcome.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let source = headers
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    let ip = extract_ip(&headers, addr);
    let location = match &ip {
        Some(ip) => geo::lookup(ip, &state.geo_cache).await,
        None => None,
    };

    let ctx = ClickContext { source, location };

    match state.shortener.visit(&code, ctx, Utc::now()).await {
        Ok(record) => {
            tracing::info!("redirecting '{}' -> {}", code, record.long_url);
            Redirect::to(&record.long_url).into_response()
        }
        Err(e @ ShortenError::NotFound) => {
            tracing::warn!("short code not found: {}", code);
            e.into_response()
        }
        Err(e @ ShortenError::Expired) => {
            tracing::warn!("expired short code accessed: {}", code);
            e.into_response()
        }
        Err(e) => e.into_response(),
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Determine the real client IP, preferring common proxy headers.
fn extract_ip(headers: &HeaderMap, addr: SocketAddr) -> Option<String> {
    // X-Forwarded-For can be a comma-separated list; take the first entry.
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = xff.split(',').next().map(str::trim) {
            if !ip.is_empty() {
                return Some(ip.to_owned());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return Some(real_ip.to_owned());
        }
    }

    Some(addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr() -> SocketAddr {
        "203.0.113.7:443".parse().unwrap()
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("198.51.100.2, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.9"));

        assert_eq!(extract_ip(&headers, addr()).as_deref(), Some("198.51.100.2"));
    }

    #[test]
    fn test_extract_ip_falls_back_to_real_ip_then_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.9"));
        assert_eq!(extract_ip(&headers, addr()).as_deref(), Some("198.51.100.9"));

        let headers = HeaderMap::new();
        assert_eq!(extract_ip(&headers, addr()).as_deref(), Some("203.0.113.7"));
    }
}
