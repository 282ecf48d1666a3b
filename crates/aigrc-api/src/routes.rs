//! Sync/Batch ingestion endpoints plus the read-only listing surface (§6).

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::state::AppState;
use aigrc_core::error::EventErrorCode;
use aigrc_core::event::GovernanceEvent;
use aigrc_core::outcome::{BatchResponse, EventOutcome};
use aigrc_persist::backend::ListFilter;
use aigrc_persist::store::MAX_BATCH_SIZE;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", service: "aigrc-event-pipeline" })
}

#[derive(Debug, Serialize)]
struct PushResponseBody {
    status: &'static str,
    #[serde(rename = "eventId")]
    event_id: String,
    #[serde(rename = "receivedAt")]
    received_at: DateTime<Utc>,
}

/// `POST /v1/events` (C7): 201 on a new record, 200 on replay of a
/// previously accepted id, 403 when `orgId` doesn't match the bearer
/// principal's org, 400 on any validation failure.
pub async fn post_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let event: GovernanceEvent = aigrc_validate::validate_or_throw(&body)?;

    let outcome = state.store().store(event, &ctx.org_id).await?;

    match outcome {
        EventOutcome::Created { id, received_at } => Ok((
            StatusCode::CREATED,
            Json(PushResponseBody { status: "accepted", event_id: id, received_at }),
        )
            .into_response()),
        EventOutcome::Duplicate { id, received_at } => Ok((
            StatusCode::OK,
            Json(PushResponseBody { status: "accepted", event_id: id, received_at }),
        )
            .into_response()),
        EventOutcome::Rejected { error, .. } if error.code == EventErrorCode::EvtOrgMismatch => {
            Err(ApiError::OrgMismatch)
        }
        EventOutcome::Rejected { error, .. } => Err(ApiError::Validation(error)),
    }
}

/// `POST /v1/events/batch` (C8): per-element outcome, envelope-level 200
/// provided the body itself parsed as a JSON array within the size cap.
pub async fn post_events_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<Value>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Value::Array(items) = body else {
        return Err(ApiError::SchemaInvalid);
    };

    if items.len() > MAX_BATCH_SIZE {
        return Err(ApiError::BatchTooLarge { max: MAX_BATCH_SIZE });
    }

    let mut response = BatchResponse::empty();
    for item in items {
        match aigrc_validate::validate_or_throw(&item) {
            Ok(event) => {
                let outcome = state.store().store(event, &ctx.org_id).await?;
                response.push(outcome);
            }
            Err(error) => {
                let id = item.get("id").and_then(Value::as_str).unwrap_or("unknown").to_string();
                response.push(EventOutcome::Rejected { id, error });
            }
        }
    }

    Ok(Json(response))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListEventsQuery {
    asset_id: Option<String>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    criticality: Option<String>,
    since: Option<DateTime<Utc>>,
    limit: Option<usize>,
    offset: Option<usize>,
}

/// Maximum page size for `GET /v1/events` (§6).
const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
struct ListEventsResponse {
    events: Vec<GovernanceEvent>,
    limit: usize,
    offset: usize,
}

pub async fn list_events(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(MAX_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let filter = ListFilter {
        asset_id: query.asset_id,
        event_type: query.event_type,
        criticality: query.criticality,
        since: query.since,
        limit,
        offset,
    };

    let events = state.store().list(&ctx.org_id, &filter).await?;
    Ok(Json(ListEventsResponse { events, limit, offset }))
}

pub async fn get_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.store().find_by_id(&id, &ctx.org_id).await? {
        Some(event) => Ok(Json(event).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": {"message": "event not found"}})),
        )
            .into_response()),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListAssetsQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListAssetsResponse {
    assets: Vec<String>,
    limit: usize,
    offset: usize,
}

pub async fn list_assets(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListAssetsQuery>,
) -> Result<Json<ListAssetsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(MAX_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let assets = state.store().list_asset_ids(&ctx.org_id, limit, offset).await?;
    Ok(Json(ListAssetsResponse { assets, limit, offset }))
}

/// Assembles the full route table with the ambient middleware stack.
///
/// `.layer()` calls wrap outside-in in the order they're added, so the
/// *last* layer added is the *first* one a request passes through. Auth
/// must therefore be registered after rate-limiting, so it runs before it
/// and populates the [`AuthContext`] that `rate_limit_middleware` reads.
pub fn router(state: AppState, config: &crate::config::ApiConfig) -> Router {
    use crate::middleware::{
        auth_middleware, body_limit_layer, cors_layer, rate_limit_middleware, request_id_middleware,
        timeout_layer, tracing_middleware,
    };
    use tower_http::compression::CompressionLayer;

    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/events", post(post_event).get(list_events))
        .route("/v1/events/batch", post(post_events_batch))
        .route("/v1/events/{id}", get(get_event))
        .route("/v1/assets", get(list_assets))
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(axum::middleware::from_fn(tracing_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(timeout_layer(config.request_timeout))
        .layer(body_limit_layer(config.max_body_bytes))
        .layer(CompressionLayer::new())
        .with_state(state)
}
