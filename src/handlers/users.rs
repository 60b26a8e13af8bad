use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use crate::db::models::UserWithRoles;
use crate::error::AppError;
use crate::handlers::parse_id;
use crate::middleware::auth::AuthUser;
use crate::middleware::json::JsonBody;
use crate::router::AppState;
use crate::service::permissions::{Action, Role};
use crate::types::auth::{RoleGrantRequest, SetActiveRequest};

fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse::<Role>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<UserWithRoles>>, AppError> {
    user.require(Action::Admin)?;
    Ok(Json(state.users.list_with_roles().await?))
}

/// POST /users/{id}/roles -> grants a role, recording the granting admin.
pub async fn grant_role_handler(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<RoleGrantRequest>,
) -> Result<Json<UserWithRoles>, AppError> {
    admin.require(Action::Admin)?;
    let id = parse_id(&id)?;
    let role = parse_role(&body.role)?;
    let user = state.users.grant_role(id, role, admin.id()).await?;
    info!(user = %user.email, %role, by = %admin.0.email, "role granted");
    Ok(Json(user))
}

pub async fn revoke_role_handler(
    State(state): State<AppState>,
    admin: AuthUser,
    Path((id, role)): Path<(String, String)>,
) -> Result<Json<UserWithRoles>, AppError> {
    admin.require(Action::Admin)?;
    let id = parse_id(&id)?;
    let role = parse_role(&role)?;
    if id == admin.id() && role == Role::Admin {
        return Err(AppError::Validation(
            "Cannot revoke your own admin role".to_string(),
        ));
    }
    let user = state.users.revoke_role(id, role).await?;
    info!(user = %user.email, %role, by = %admin.0.email, "role revoked");
    Ok(Json(user))
}

/// PUT /users/{id}/active -> soft (de)activation.
pub async fn set_active_handler(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SetActiveRequest>,
) -> Result<Json<UserWithRoles>, AppError> {
    admin.require(Action::Admin)?;
    let id = parse_id(&id)?;
    if id == admin.id() && !body.is_active {
        return Err(AppError::Validation(
            "Cannot deactivate your own account".to_string(),
        ));
    }
    let user = state.users.set_active(id, body.is_active).await?;
    info!(user = %user.email, active = body.is_active, by = %admin.0.email, "user activation changed");
    Ok(Json(user))
}
