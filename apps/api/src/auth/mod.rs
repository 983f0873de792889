//! Authentication: bearer tokens, password hashing, one-time codes and the
//! request extractor that ties them together.

pub mod handlers;
pub mod otp;
pub mod password;
pub mod token;
pub mod uploads;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

use self::token::{decode_token, revoked_key, Claims};

/// The caller behind a valid, unrevoked bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub claims: Claims,
}

impl AuthUser {
    /// 403 unless the caller has `role`.
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role != role {
            return Err(AppError::Forbidden(format!(
                "This action is only available to {role}s"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

        let claims = decode_token(token, &state.config.jwt_secret)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        if state.cache.get(&revoked_key(claims.jti)).await?.is_some() {
            return Err(AppError::Unauthorized("Token has been revoked".into()));
        }

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
            claims,
        })
    }
}
