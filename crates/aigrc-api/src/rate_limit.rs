//! Per-org rate limiting using `governor`'s GCRA implementation.
//!
//! One limiter per organization, created lazily and cached; a 429 response
//! carries the wait time as `Retry-After` (§6).

use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as Governor,
};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

type OrgLimiter = Governor<NotKeyed, InMemoryState, DefaultClock>;

pub struct OrgRateLimiter {
    quota: Quota,
    limiters: RwLock<HashMap<String, Arc<OrgLimiter>>>,
}

impl OrgRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute.max(1)).expect("max(1) is never zero");
        Self { quota: Quota::per_minute(per_minute), limiters: RwLock::new(HashMap::new()) }
    }

    /// Returns `Ok(())` if the org is within quota, or `Err(wait)` carrying
    /// how long the caller should wait before retrying.
    pub async fn check(&self, org_id: &str) -> Result<(), Duration> {
        let limiter = self.get_or_create(org_id).await;
        match limiter.check() {
            Ok(()) => Ok(()),
            Err(not_until) => Err(not_until.wait_time_from(DefaultClock::default().now())),
        }
    }

    async fn get_or_create(&self, org_id: &str) -> Arc<OrgLimiter> {
        if let Some(limiter) = self.limiters.read().await.get(org_id) {
            return limiter.clone();
        }
        let mut limiters = self.limiters.write().await;
        limiters
            .entry(org_id.to_string())
            .or_insert_with(|| Arc::new(Governor::direct(self.quota)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn distinct_orgs_have_independent_quotas() {
        let limiter = OrgRateLimiter::new(1);
        assert!(limiter.check("org-a").await.is_ok());
        assert!(limiter.check("org-a").await.is_err());
        assert!(limiter.check("org-b").await.is_ok());
    }
}
