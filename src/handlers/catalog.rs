use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::info;

use crate::db::models::{Chemical, Supplier};
use crate::error::AppError;
use crate::handlers::parse_id;
use crate::middleware::auth::AuthUser;
use crate::middleware::json::JsonBody;
use crate::router::AppState;
use crate::service::permissions::Action;
use crate::types::catalog::{NewChemical, NewSupplier, SupplierPatch};

pub async fn list_chemicals_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Chemical>>, AppError> {
    user.require(Action::View)?;
    Ok(Json(state.catalog.list_chemicals().await?))
}

pub async fn create_chemical_handler(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<NewChemical>,
) -> Result<(StatusCode, Json<Chemical>), AppError> {
    user.require(Action::Create)?;
    let (name, chemical) = body.validate()?;
    let created = state.catalog.create_chemical(&name, chemical).await?;
    info!(id = %created.id, name = %created.chemical_name, "chemical created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /chemicals/{id} -> 409 while inventory still references it.
pub async fn delete_chemical_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    user.require(Action::Delete)?;
    let id = parse_id(&id)?;
    state.catalog.delete_chemical(id).await?;
    info!(%id, "chemical deleted");
    Ok(Json(json!({ "message": "Chemical deleted successfully" })))
}

pub async fn list_suppliers_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Supplier>>, AppError> {
    user.require(Action::View)?;
    Ok(Json(state.catalog.list_suppliers().await?))
}

pub async fn create_supplier_handler(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<NewSupplier>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    user.require(Action::Create)?;
    let (name, supplier) = body.validate()?;
    let created = state.catalog.create_supplier(&name, supplier).await?;
    info!(id = %created.id, name = %created.name, "supplier created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_supplier_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SupplierPatch>,
) -> Result<Json<Supplier>, AppError> {
    user.require(Action::Update)?;
    let id = parse_id(&id)?;
    let updated = state.catalog.update_supplier(id, body.validate()?).await?;
    info!(%id, "supplier updated");
    Ok(Json(updated))
}

/// DELETE /suppliers/{id} -> inventory rows keep existing without a supplier.
pub async fn delete_supplier_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    user.require(Action::Delete)?;
    let id = parse_id(&id)?;
    state.catalog.delete_supplier(id).await?;
    info!(%id, "supplier deleted");
    Ok(Json(json!({ "message": "Supplier deleted successfully" })))
}
