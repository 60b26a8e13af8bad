use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::debug;
use uuid::Uuid;

use crate::db::inventory::Actor;
use crate::db::models::UserWithRoles;
use crate::error::AppError;
use crate::router::AppState;
use crate::service::permissions::{Action, Role, can_perform};

/// Resolve a bearer token to an active user with roles.
pub async fn authenticate(state: &AppState, token: &str) -> Result<UserWithRoles, AppError> {
    let claims = state.tokens.verify(token).map_err(|e| {
        debug!(error = %e, "rejected bearer token");
        AppError::Unauthorized("Invalid token")
    })?;
    state
        .users
        .find_with_roles(claims.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized("User not found or inactive"))
}

/// Authenticated caller. Roles are re-read from the database on every
/// request, so revocations apply before the token expires.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserWithRoles);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.roles.iter().any(|r| r == Role::Admin.as_str())
    }

    pub fn can(&self, action: Action) -> bool {
        can_perform(&self.0.roles, action)
    }

    pub fn require(&self, action: Action) -> Result<(), AppError> {
        if self.can(action) {
            return Ok(());
        }
        debug!(user = %self.0.email, ?action, roles = ?self.0.roles, "permission denied");
        Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id(),
            is_admin: self.is_admin(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("No token provided"))?;
        Ok(Self(authenticate(state, bearer.token()).await?))
    }
}

/// Caller that may be anonymous. A present but invalid token is still 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(Self(None));
        }
        AuthUser::from_request_parts(parts, state)
            .await
            .map(|u| Self(Some(u)))
    }
}
