use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{
    claims::TokenKind,
    identity::{Identity, Role},
    jwt::JwtKeys,
};
use crate::error::AppError;

/// Extracts and validates the bearer access token.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let identity = keys.decode(token, TokenKind::Access).map_err(|e| {
            warn!(error = %e, "access token rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(AuthUser(identity))
    }
}

/// An authenticated recruiter; any other role is rejected with 403.
pub struct RequireRecruiter(pub Identity);

/// An authenticated candidate; any other role is rejected with 403.
pub struct RequireCandidate(pub Identity);

async fn require_role<S>(parts: &mut Parts, state: &S, role: Role) -> Result<Identity, AppError>
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
    if identity.role != role {
        warn!(account_id = %identity.id, role = %identity.role, required = %role, "role mismatch");
    }
    identity.require(role)?;
    Ok(identity)
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireRecruiter
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Recruiter).await.map(RequireRecruiter)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireCandidate
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Candidate).await.map(RequireCandidate)
    }
}
