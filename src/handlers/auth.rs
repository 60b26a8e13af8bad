use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, warn};

use crate::error::AppError;
use crate::middleware::auth::MaybeAuthUser;
use crate::middleware::json::JsonBody;
use crate::router::AppState;
use crate::service::password::{hash_password, verify_password};
use crate::service::permissions::{Action, Role};
use crate::types::auth::{AuthResponse, LoginRequest, RegisterRequest};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// POST /auth/login -> exchanges email + password for a bearer token.
pub async fn login_handler(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (email, password) = body.validate()?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        verify_password(&password, &state.dummy_password_hash).await?;
        info!(%email, "login for unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };
    if !verify_password(&password, &user.password_hash).await? {
        warn!(%email, "login with wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }
    if !user.is_active {
        warn!(%email, "login for inactive user");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    let user = state
        .users
        .find_with_roles(user.id)
        .await?
        .ok_or(AppError::Unauthorized(INVALID_CREDENTIALS))?;
    let token = state
        .tokens
        .issue(user.id, &user.email, &user.name, &user.roles)?;
    info!(user = %user.email, "login succeeded");
    Ok(Json(AuthResponse { token, user }))
}

/// POST /auth/register -> creates a user and returns a bearer token for it.
///
/// Requires an admin caller unless open registration is configured or no
/// user exists yet; that first user becomes admin, later ones `user_edit`.
pub async fn register_handler(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let bootstrap = state.users.count().await? == 0;
    let caller_is_admin = caller.as_ref().is_some_and(|c| c.can(Action::Admin));
    if !(bootstrap || state.open_registration || caller_is_admin) {
        return Err(match caller {
            None => AppError::Unauthorized("No token provided"),
            Some(_) => AppError::Forbidden("Insufficient permissions".to_string()),
        });
    }

    let reg = body.validate()?;
    if state.users.find_by_email(&reg.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(&reg.password, state.bcrypt_cost).await?;
    let role = if bootstrap { Role::Admin } else { Role::UserEdit };
    let user = state
        .users
        .create(
            &reg.email,
            &reg.name,
            &password_hash,
            role,
            caller.as_ref().map(|c| c.id()),
        )
        .await?;
    let token = state
        .tokens
        .issue(user.id, &user.email, &user.name, &user.roles)?;

    info!(user = %user.email, %role, bootstrap, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}
