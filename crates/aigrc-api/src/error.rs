//! HTTP error mapping for the ingestion gateway.
//!
//! Every failure that reaches a producer is shaped `{error:{code, message,
//! field?, schemaPath?}}` (§6) — `ApiError` is the single place that maps an
//! internal failure onto that body plus an HTTP status.

use aigrc_core::error::{EventErrorCode, ValidationError};
use aigrc_persist::backend::StoreError;
use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("bearer token missing or invalid")]
    Unauthorized,
    #[error("event orgId does not match the authenticated principal's org")]
    OrgMismatch,
    #[error("batch exceeds the maximum of {max} elements")]
    BatchTooLarge { max: usize },
    #[error("request body must be a JSON array")]
    SchemaInvalid,
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "schemaPath")]
    schema_path: Option<String>,
}

impl From<&ValidationError> for ErrorDetail {
    fn from(e: &ValidationError) -> Self {
        Self {
            code: e.code.as_str(),
            message: e.message.clone(),
            field: e.field.clone(),
            schema_path: e.schema_path.clone(),
        }
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, ErrorBody { error: e.into() }),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: ErrorDetail {
                        code: EventErrorCode::EvtInternal.as_str(),
                        message: self.to_string(),
                        field: None,
                        schema_path: None,
                    },
                },
            ),
            Self::OrgMismatch => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: ErrorDetail {
                        code: EventErrorCode::EvtOrgMismatch.as_str(),
                        message: self.to_string(),
                        field: Some("orgId".to_string()),
                        schema_path: None,
                    },
                },
            ),
            Self::BatchTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    error: ErrorDetail {
                        code: EventErrorCode::EvtBatchTooLarge.as_str(),
                        message: self.to_string(),
                        field: None,
                        schema_path: None,
                    },
                },
            ),
            Self::SchemaInvalid => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: ErrorDetail {
                        code: EventErrorCode::EvtSchemaInvalid.as_str(),
                        message: self.to_string(),
                        field: None,
                        schema_path: None,
                    },
                },
            ),
            Self::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    error: ErrorDetail {
                        code: EventErrorCode::EvtRateLimited.as_str(),
                        message: self.to_string(),
                        field: None,
                        schema_path: None,
                    },
                },
            ),
            Self::Store(e) => {
                tracing::error!(error = %e, "store backend failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: ErrorDetail {
                            code: EventErrorCode::EvtInternal.as_str(),
                            message: "an internal error occurred".to_string(),
                            field: None,
                            schema_path: None,
                        },
                    },
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: ErrorDetail {
                            code: EventErrorCode::EvtInternal.as_str(),
                            message: "an internal error occurred".to_string(),
                            field: None,
                            schema_path: None,
                        },
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert("Retry-After", retry_after_secs.to_string().parse().unwrap());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_mismatch_maps_to_403() {
        let err = ApiError::OrgMismatch;
        let (status, _) = err.status_and_body();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn batch_too_large_maps_to_413() {
        let err = ApiError::BatchTooLarge { max: 1000 };
        let (status, _) = err.status_and_body();
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn rate_limited_maps_to_429() {
        let err = ApiError::RateLimited { retry_after_secs: 30 };
        let (status, _) = err.status_and_body();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
}
