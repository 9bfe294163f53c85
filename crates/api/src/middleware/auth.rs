//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gymflow_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated operator extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Handlers under `/gyms/{gym_id}` call [`AuthOperator::ensure_gym`] before
/// touching any data, so an operator only ever sees their own gym.
#[derive(Debug, Clone)]
pub struct AuthOperator {
    /// Operator id at the identity provider (from `claims.sub`).
    pub operator_id: String,
    /// The gym the operator manages.
    pub gym_id: DbId,
}

impl AuthOperator {
    /// Reject requests for a gym other than the operator's own.
    pub fn ensure_gym(&self, gym_id: DbId) -> Result<(), AppError> {
        if self.gym_id != gym_id {
            tracing::warn!(
                operator_id = %self.operator_id,
                operator_gym_id = self.gym_id,
                requested_gym_id = gym_id,
                "Operator requested another gym"
            );
            return Err(AppError::Forbidden(format!(
                "Not permitted to access gym {gym_id}"
            )));
        }
        Ok(())
    }
}

impl FromRequestParts<AppState> for AuthOperator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("Missing Authorization header".into())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            )
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(AuthOperator {
            operator_id: claims.sub,
            gym_id: claims.gym_id,
        })
    }
}
