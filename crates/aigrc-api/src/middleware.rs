//! Tower/Axum middleware stack: auth, org-scoped rate limiting, request-id
//! tagging, and request tracing (§6 "Ambient middleware").

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::state::AppState;

/// `/v1/health` is the only route exempt from bearer auth.
const AUTH_EXEMPT_PATHS: &[&str] = &["/v1/health"];

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if AUTH_EXEMPT_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let ctx = state.jwt_auth().authenticate(header_value)?;
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(ctx) = request.extensions().get::<AuthContext>() else {
        return Ok(next.run(request).await);
    };

    match state.rate_limiter().check(&ctx.org_id).await {
        Ok(()) => Ok(next.run(request).await),
        Err(wait) => Err(ApiError::RateLimited { retry_after_secs: wait.as_secs().max(1) }),
    }
}

#[derive(Clone, Debug)]
pub struct RequestId(pub String);

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone()).unwrap_or_default();
    let org_id = request.extensions().get::<AuthContext>().map(|c| c.org_id.clone());

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
        org_id = org_id.as_deref().unwrap_or("-"),
    );
    let _enter = span.enter();

    let response = next.run(request).await;
    tracing::info!(
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

pub fn cors_layer(allowed_origins: &[String]) -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowOrigin, CorsLayer};

    let allow_origin = if allowed_origins.is_empty() {
        AllowOrigin::exact("https://localhost".parse().unwrap())
    } else {
        let origins: Vec<_> = allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        if origins.is_empty() {
            AllowOrigin::exact("https://localhost".parse().unwrap())
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

#[allow(deprecated)]
pub fn timeout_layer(duration: std::time::Duration) -> tower_http::timeout::TimeoutLayer {
    tower_http::timeout::TimeoutLayer::new(duration)
}

pub fn body_limit_layer(limit: usize) -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(limit)
}
