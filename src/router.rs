use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::config::Config;
use crate::db::{CatalogStore, InventoryStore, SqlitePool, UserStore};
use crate::error::AppError;
use crate::handlers::{auth, catalog, health, inventory, users};
use crate::service::token::{TokenService, parse_expiry};

/// Shared handler state. Cloning is cheap: the pool and token keys are
/// reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub users: UserStore,
    pub catalog: CatalogStore,
    pub inventory: InventoryStore,
    pub tokens: Arc<TokenService>,
    pub bcrypt_cost: u32,
    /// Hash at the configured cost, verified against on unknown-email logins
    /// so they take as long as real ones.
    pub dummy_password_hash: Arc<str>,
    pub open_registration: bool,
}

impl AppState {
    pub fn new(pool: SqlitePool, cfg: &Config) -> Result<Self, AppError> {
        let ttl = parse_expiry(&cfg.jwt_expires_in).ok_or_else(|| {
            AppError::Internal(format!(
                "invalid jwt_expires_in `{}`",
                cfg.jwt_expires_in
            ))
        })?;
        let dummy_password_hash = bcrypt::hash("chem-inventory-timing-pad", cfg.bcrypt_cost)?;
        Ok(Self {
            users: UserStore::new(pool.clone()),
            catalog: CatalogStore::new(pool.clone()),
            inventory: InventoryStore::new(pool.clone()),
            pool,
            tokens: Arc::new(TokenService::new(&cfg.jwt_secret, ttl)),
            bcrypt_cost: cfg.bcrypt_cost,
            dummy_password_hash: dummy_password_hash.into(),
            open_registration: cfg.open_registration,
        })
    }
}

pub fn inventory_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/register", post(auth::register_handler))
        .route(
            "/inventory",
            get(inventory::list_handler).post(inventory::create_handler),
        )
        .route("/inventory/export", get(inventory::export_handler))
        .route(
            "/inventory/{id}",
            get(inventory::get_handler)
                .put(inventory::update_handler)
                .delete(inventory::delete_handler),
        )
        // legacy paths of the first backend iteration
        .route(
            "/data",
            get(inventory::list_handler).post(inventory::create_handler),
        )
        .route(
            "/data/{id}",
            put(inventory::update_handler).delete(inventory::delete_handler),
        )
        .route(
            "/chemicals",
            get(catalog::list_chemicals_handler).post(catalog::create_chemical_handler),
        )
        .route("/chemicals/{id}", delete(catalog::delete_chemical_handler))
        .route(
            "/suppliers",
            get(catalog::list_suppliers_handler).post(catalog::create_supplier_handler),
        )
        .route(
            "/suppliers/{id}",
            put(catalog::update_supplier_handler).delete(catalog::delete_supplier_handler),
        )
        .route("/users", get(users::list_users_handler))
        .route("/users/{id}/roles", post(users::grant_role_handler))
        .route("/users/{id}/roles/{role}", delete(users::revoke_role_handler))
        .route("/users/{id}/active", put(users::set_active_handler))
        .with_state(state)
}
