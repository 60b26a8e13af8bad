use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::db::models::InventoryRow;
use crate::error::AppError;
use crate::handlers::parse_id;
use crate::middleware::auth::AuthUser;
use crate::middleware::json::JsonBody;
use crate::router::AppState;
use crate::service::csv_export::{export_filename, inventory_to_csv};
use crate::service::permissions::Action;
use crate::types::inventory::{
    BulkInsertResponse, CreateInventoryBody, InventoryFilter, InventoryPatch, InventoryQuery,
};

/// GET /inventory -> joined rows, filtered by `search`, `hazardClass`, `location`.
pub async fn list_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<Vec<InventoryRow>>, AppError> {
    user.require(Action::View)?;
    let filter = InventoryFilter::try_from(query)?;
    Ok(Json(state.inventory.list(&filter).await?))
}

/// GET /inventory/export -> the same listing as a CSV download.
pub async fn export_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> Result<Response, AppError> {
    user.require(Action::View)?;
    let filter = InventoryFilter::try_from(query)?;
    let rows = state.inventory.list(&filter).await?;
    let body = inventory_to_csv(&rows)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(Utc::now().date_naive())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn get_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<InventoryRow>, AppError> {
    user.require(Action::View)?;
    Ok(Json(state.inventory.get(parse_id(&id)?).await?))
}

/// POST /inventory -> one item (201 + row) or an array (200 + per-item report).
pub async fn create_handler(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<Value>,
) -> Result<Response, AppError> {
    user.require(Action::Create)?;
    match CreateInventoryBody::try_from(body)? {
        CreateInventoryBody::One(item) => {
            let row = state.inventory.create(item.validate()?, user.id()).await?;
            info!(id = %row.id, chemical = %row.chemical_name, by = %user.0.email, "inventory item created");
            Ok((StatusCode::CREATED, Json(row)).into_response())
        }
        CreateInventoryBody::Many(items) => {
            let total = items.len();
            let (data, errors) = state.inventory.create_many(items, user.id()).await;
            info!(total, created = data.len(), failed = errors.len(), by = %user.0.email, "bulk inventory insert");
            Ok(Json(BulkInsertResponse {
                success: errors.is_empty(),
                data,
                errors,
            })
            .into_response())
        }
    }
}

/// PUT /inventory/{id} -> partial update by the owner or an admin.
pub async fn update_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<InventoryPatch>,
) -> Result<Json<InventoryRow>, AppError> {
    user.require(Action::Update)?;
    let id = parse_id(&id)?;
    let patch = body.validate()?;
    let row = state.inventory.update(id, patch, user.actor()).await?;
    info!(%id, by = %user.0.email, "inventory item updated");
    Ok(Json(row))
}

/// DELETE /inventory/{id} -> removes the item (owner or admin).
pub async fn delete_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    user.require(Action::Delete)?;
    let id = parse_id(&id)?;
    state.inventory.delete(id, user.actor()).await?;
    info!(%id, by = %user.0.email, "inventory item deleted");
    Ok(Json(
        json!({ "message": "Inventory item deleted successfully" }),
    ))
}
