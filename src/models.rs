use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shortened-URL record, the only persisted entity.
///
/// Field names serialize in camelCase and timestamps as RFC 3339 so the
/// on-disk document matches the wire format exposed by the stats API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub id: Uuid,
    pub long_url: String,
    pub short_code: String,
    /// Derived display string: `{base_url}/{short_code}`.
    pub short_url: String,
    pub created_at: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub clicks: u64,
    /// Insertion-ordered click history; absent in the document means empty.
    #[serde(default)]
    pub click_data: Vec<ClickEvent>,
}

impl UrlRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_date
    }

    pub fn status(&self, now: DateTime<Utc>) -> LinkStatus {
        if self.is_expired(now) {
            LinkStatus::Expired
        } else {
            LinkStatus::Active
        }
    }
}

/// A single recorded resolution of a short code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub location: String,
}

/// Request-side metadata for one resolution, gathered by the caller.
/// Missing fields fall back to "Direct" / "Unknown" when the click is
/// recorded.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub source: Option<String>,
    pub location: Option<String>,
}

/// One entry of a shorten submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    pub long_url: String,
    #[serde(default)]
    pub validity_minutes: Option<i64>,
    #[serde(default)]
    pub custom_code: Option<String>,
}

/// Expiry state of a record relative to some instant, computed at render
/// time rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Expired,
}
