use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

use crate::codegen;
use crate::error::ShortenError;
use crate::models::{ClickContext, ClickEvent, ShortenRequest, UrlRecord};
use crate::store::UrlStore;

/// Validity window applied when a submission leaves it unset.
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

/// Maximum number of URLs accepted in one submission.
pub const MAX_BATCH_SIZE: usize = 5;

/// Generation attempts before a batch gives up with `CodeSpaceExhausted`.
const MAX_CODE_ATTEMPTS: usize = 32;

/// Allocation and resolution over an injected [`UrlStore`].
///
/// Every write path is a load → mutate → save cycle over the whole
/// collection, serialized behind `write_lock` so two in-process writers
/// cannot clobber each other's snapshot. Writers in *other* processes
/// sharing the same store still race last-write-wins.
pub struct Shortener {
    store: Arc<dyn UrlStore>,
    base_url: String,
    write_lock: Mutex<()>,
}

impl Shortener {
    pub fn new(store: Arc<dyn UrlStore>, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into(),
            write_lock: Mutex::new(()),
        }
    }

    // ── Allocation ─────────────────────────────────────────────────────────

    /// Shorten a submission of up to [`MAX_BATCH_SIZE`] URLs.
    ///
    /// Blank entries are skipped; positions in errors are 1-based indices
    /// into the submitted list. The whole submission is validated before the
    /// store is touched and persisted with a single save at the end, so any
    /// failure leaves the store unchanged.
    pub async fn shorten_batch(
        &self,
        requests: &[ShortenRequest],
        now: DateTime<Utc>,
    ) -> Result<Vec<UrlRecord>, ShortenError> {
        let entries: Vec<(usize, &ShortenRequest)> = requests
            .iter()
            .enumerate()
            .map(|(i, req)| (i + 1, req))
            .filter(|(_, req)| !req.long_url.trim().is_empty())
            .collect();

        if entries.len() > MAX_BATCH_SIZE {
            return Err(ShortenError::TooManyUrls {
                max: MAX_BATCH_SIZE,
            });
        }

        // Validate every entry up front, before any allocation
        for (position, req) in &entries {
            if Url::parse(req.long_url.trim()).is_err() {
                return Err(ShortenError::InvalidUrl {
                    position: *position,
                });
            }
            if let Some(validity) = req.validity_minutes {
                if validity <= 0 {
                    return Err(ShortenError::InvalidValidity {
                        position: *position,
                    });
                }
            }
        }

        let _guard = self.write_lock.lock().await;

        let mut records = self.store.load().await?;
        let mut used: HashSet<String> = records.iter().map(|r| r.short_code.clone()).collect();
        let mut created = Vec::with_capacity(entries.len());

        for (_, req) in entries {
            let code = match normalized_custom_code(req) {
                Some(custom) => {
                    // A caller-chosen code is used verbatim, but may not
                    // shadow an existing mapping
                    if used.contains(custom) {
                        return Err(ShortenError::CodeTaken {
                            code: custom.to_owned(),
                        });
                    }
                    custom.to_owned()
                }
                None => next_code(&used, codegen::generate)?,
            };
            used.insert(code.clone());

            let validity = req.validity_minutes.unwrap_or(DEFAULT_VALIDITY_MINUTES);
            let record = UrlRecord {
                id: record_id(now),
                long_url: req.long_url.trim().to_owned(),
                short_url: format!("{}/{}", self.base_url, code),
                short_code: code,
                created_at: now,
                expiry_date: now + Duration::minutes(validity),
                clicks: 0,
                click_data: Vec::new(),
            };

            records.push(record.clone());
            created.push(record);
        }

        self.store.save(&records).await?;
        Ok(created)
    }

    // ── Resolution ─────────────────────────────────────────────────────────

    /// Resolve a short code for an actual visit.
    ///
    /// On success the matching record gains one click and one click event
    /// and the collection is persisted; the updated record is returned so
    /// the caller can redirect to its `long_url`. NOT idempotent — every
    /// successful call records another click. Display paths must use
    /// [`Shortener::peek`] instead.
    pub async fn visit(
        &self,
        code: &str,
        ctx: ClickContext,
        now: DateTime<Utc>,
    ) -> Result<UrlRecord, ShortenError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.store.load().await?;
        let record = records
            .iter_mut()
            .find(|r| r.short_code == code)
            .ok_or(ShortenError::NotFound)?;

        if record.is_expired(now) {
            return Err(ShortenError::Expired);
        }

        record.clicks += 1;
        record.click_data.push(ClickEvent {
            timestamp: now,
            source: ctx.source.unwrap_or_else(|| "Direct".to_owned()),
            location: ctx.location.unwrap_or_else(|| "Unknown".to_owned()),
        });
        let updated = record.clone();

        self.store.save(&records).await?;
        Ok(updated)
    }

    /// Resolve a short code without recording a click.
    ///
    /// Same not-found / expired classification as [`Shortener::visit`], zero
    /// side effects. This is the read the stats and preview surfaces use.
    pub async fn peek(&self, code: &str, now: DateTime<Utc>) -> Result<UrlRecord, ShortenError> {
        let records = self.store.load().await?;
        let record = records
            .into_iter()
            .find(|r| r.short_code == code)
            .ok_or(ShortenError::NotFound)?;

        if record.is_expired(now) {
            return Err(ShortenError::Expired);
        }

        Ok(record)
    }

    /// The full record collection, for the statistics surface.
    pub async fn list(&self) -> Result<Vec<UrlRecord>, ShortenError> {
        Ok(self.store.load().await?)
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Treat an absent, empty, or whitespace-only custom code as "not supplied".
fn normalized_custom_code(req: &ShortenRequest) -> Option<&str> {
    req.custom_code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Draw codes from `generate` until one is free of `used`, giving up after
/// [`MAX_CODE_ATTEMPTS`] draws.
fn next_code(
    used: &HashSet<String>,
    mut generate: impl FnMut() -> String,
) -> Result<String, ShortenError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate();
        if !used.contains(&code) {
            return Ok(code);
        }
    }
    Err(ShortenError::CodeSpaceExhausted {
        attempts: MAX_CODE_ATTEMPTS,
    })
}

/// Record id: UUIDv7, i.e. creation timestamp plus randomness. Collisions
/// are improbable but not strictly enforced.
fn record_id(now: DateTime<Utc>) -> Uuid {
    let ts = uuid::Timestamp::from_unix(
        uuid::NoContext,
        now.timestamp().max(0) as u64,
        now.timestamp_subsec_nanos(),
    );
    Uuid::new_v7(ts)
}
