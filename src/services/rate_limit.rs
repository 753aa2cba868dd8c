//! Fixed-window rate limiting over an external counter store.
//!
//! Each caller identity gets a per-minute and a per-day bucket, both keyed
//! by the UTC timestamp of the current window. The check only reads;
//! admitted requests schedule their increments through [`BackgroundTasks`],
//! so a concurrent burst from one identity can land slightly over the
//! nominal limit.

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use crate::services::background::BackgroundTasks;
use crate::services::store::CounterStore;

/// Counter lifetimes: each bucket outlives its window by a short margin.
pub const MINUTE_TTL_SECONDS: u64 = 90;
pub const DAY_TTL_SECONDS: u64 = 60 * 60 * 24 + 60;

const CLIENT_IP_HEADER: &str = "cf-connecting-ip";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Rate-limit identity for a request: the proxy-reported client address,
/// or `anon` when neither header carries one.
pub fn caller_identity(headers: &HeaderMap) -> String {
    headers
        .get(CLIENT_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            headers
                .get(FORWARDED_FOR_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|list| list.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or("anon")
        .to_string()
}

/// Key of the per-minute bucket: `m:{identity}:{YYYY-MM-DDTHH:MM}` in UTC.
pub fn minute_key(identity: &str, now: DateTime<Utc>) -> String {
    format!("m:{}:{}", identity, now.format("%Y-%m-%dT%H:%M"))
}

/// Key of the per-day bucket: `d:{identity}:{YYYY-MM-DD}` in UTC.
pub fn day_key(identity: &str, now: DateTime<Utc>) -> String {
    format!("d:{}:{}", identity, now.format("%Y-%m-%d"))
}

/// Counter readings taken by a passing check, used to schedule increments.
#[derive(Debug, Clone)]
pub struct BucketCounts {
    pub minute_key: String,
    pub day_key: String,
    pub minute: u64,
    pub day: u64,
}

#[derive(Debug)]
pub enum RateDecision {
    Allowed(BucketCounts),
    Limited,
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    minute_limit: u64,
    daily_limit: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, minute_limit: u64, daily_limit: u64) -> Self {
        Self {
            store,
            minute_limit,
            daily_limit,
        }
    }

    /// Read both buckets for `identity` and decide whether the request may
    /// proceed. Missing and malformed counters read as zero.
    pub async fn check(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, anyhow::Error> {
        let minute_key = minute_key(identity, now);
        let day_key = day_key(identity, now);

        let minute = parse_count(self.store.get(&minute_key).await?);
        let day = parse_count(self.store.get(&day_key).await?);

        if minute >= self.minute_limit || day >= self.daily_limit {
            return Ok(RateDecision::Limited);
        }

        Ok(RateDecision::Allowed(BucketCounts {
            minute_key,
            day_key,
            minute,
            day,
        }))
    }

    /// Schedule both counter increments; the caller's response does not
    /// wait for the writes, and a failed write only logs.
    pub fn record(&self, counts: BucketCounts, tasks: &BackgroundTasks) {
        let BucketCounts {
            minute_key,
            day_key,
            minute,
            day,
        } = counts;

        let store = Arc::clone(&self.store);
        tasks.spawn(async move {
            if let Err(e) = store
                .put(&minute_key, &(minute + 1).to_string(), MINUTE_TTL_SECONDS)
                .await
            {
                tracing::warn!(key = %minute_key, "Failed to persist minute counter: {}", e);
            }
        });

        let store = Arc::clone(&self.store);
        tasks.spawn(async move {
            if let Err(e) = store
                .put(&day_key, &(day + 1).to_string(), DAY_TTL_SECONDS)
                .await
            {
                tracing::warn!(key = %day_key, "Failed to persist day counter: {}", e);
            }
        });
    }
}

fn parse_count(raw: Option<String>) -> u64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(0)
}
