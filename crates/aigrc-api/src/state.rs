//! Shared application state for the ingestion gateway's Axum handlers.

use crate::auth::JwtAuth;
use crate::rate_limit::OrgRateLimiter;
use aigrc_persist::store::EventStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    store: Arc<EventStore>,
    jwt_auth: JwtAuth,
    rate_limiter: Arc<OrgRateLimiter>,
}

impl AppState {
    pub fn new(store: Arc<EventStore>, jwt_auth: JwtAuth, rate_limiter: Arc<OrgRateLimiter>) -> Self {
        Self { store, jwt_auth, rate_limiter }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn jwt_auth(&self) -> &JwtAuth {
        &self.jwt_auth
    }

    pub fn rate_limiter(&self) -> &OrgRateLimiter {
        &self.rate_limiter
    }
}
