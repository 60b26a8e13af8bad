//! Database module: models, schema and stores for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool setup, schema init, liveness probe
//! - `users.rs`, `catalog.rs`, `inventory.rs`: per-aggregate stores

pub mod catalog;
pub mod inventory;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod users;

pub use catalog::CatalogStore;
pub use inventory::{Actor, InventoryStore};
pub use sqlite::{SqlitePool, connect};
pub use users::UserStore;
