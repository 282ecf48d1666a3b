//! The HTTP ingestion gateway: sync/batch event channels (C7, C8), the
//! read-only listing surface, and the ambient auth/rate-limit/tracing
//! middleware stack that fronts them (C11, §6).

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use auth::{AuthContext, JwtAuth};
pub use config::ApiConfig;
pub use error::ApiError;
pub use rate_limit::OrgRateLimiter;
pub use routes::router;
pub use state::AppState;
