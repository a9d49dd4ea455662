use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub id: Uuid,
    pub exp: usize,
}

// ============================================================================
// Admin Identity Extractor
// ============================================================================

/// Admin id carried by a valid `Authorization: Bearer <jwt>` header.
///
/// Only proves who is calling. Permission checks happen against the stored
/// admin record.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity(pub Uuid);

impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::AuthenticationError("Missing bearer token".to_string()))?;

        let token_data = decode::<AdminClaims>(
            bearer.token(),
            &DecodingKey::from_secret(state.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!(error = %e, "Rejected admin token");
            AppError::AuthenticationError("Invalid token".to_string())
        })?;

        Ok(Self(token_data.claims.id))
    }
}
