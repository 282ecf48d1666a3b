//! Bearer-token auth and org scoping (C11).
//!
//! A bearer token decodes to `{orgId, principalType}`; every authenticated
//! request carries an [`AuthContext`] in its extensions so downstream
//! handlers never re-derive it.

use crate::error::ApiError;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims carried by a producer's bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated principal id.
    pub sub: String,
    #[serde(rename = "orgId")]
    pub org_id: String,
    #[serde(rename = "principalType")]
    pub principal_type: String,
    pub exp: i64,
}

/// The authenticated org scope a request is allowed to act within.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub org_id: String,
    pub principal_type: String,
}

/// Decodes and validates bearer tokens against a single HS256 secret.
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        Self { decoding_key, validation }
    }

    pub fn from_config(config: &crate::config::ApiConfig) -> Self {
        Self::new(&config.jwt_secret)
    }

    /// Extracts `Bearer {token}` from the raw header value.
    pub fn extract_token(header_value: &str) -> Result<&str, ApiError> {
        header_value.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)
    }

    pub fn authenticate(&self, header_value: &str) -> Result<AuthContext, ApiError> {
        let token = Self::extract_token(header_value)?;
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| ApiError::Unauthorized)?
            .claims;
        Ok(AuthContext { org_id: claims.org_id, principal_type: claims.principal_type })
    }
}
