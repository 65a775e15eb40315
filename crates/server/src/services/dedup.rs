//! Duplicate-delivery guard.
//!
//! Slack retries a webhook it believes timed out, resending the same body
//! with the same signature and timestamp. The guard remembers each
//! delivery key for the replay window so a retry is acknowledged without
//! starting a second run.

use std::time::Duration;

use moka::future::Cache;

use crate::slack::signature::TIMESTAMP_TOLERANCE_SECS;

/// Remembers recently seen delivery keys.
#[derive(Clone)]
pub struct DeliveryGuard {
    seen: Cache<String, ()>,
}

impl DeliveryGuard {
    /// Create a guard remembering keys for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Create a guard covering the signature replay window.
    #[must_use]
    pub fn for_replay_window() -> Self {
        Self::new(Duration::from_secs(TIMESTAMP_TOLERANCE_SECS))
    }

    /// Record `key`, returning `true` the first time it is seen.
    ///
    /// Concurrent calls with the same key resolve to exactly one `true`.
    pub async fn first_delivery(&self, key: String) -> bool {
        self.seen.entry(key).or_insert(()).await.is_fresh()
    }
}

impl std::fmt::Debug for DeliveryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryGuard")
            .field("entries", &self.seen.entry_count())
            .finish()
    }
}
