use crate::db::models::now_ts;
use crate::db::schema::SQLITE_INIT;
use crate::error::AppError;
use crate::service::permissions::Role;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database and initialize the schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(connect_opts)
        .await?;
    init_schema(&pool).await?;
    info!(database_url, "database ready");
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL, then seed the roles.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), AppError> {
    // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    seed_roles(pool).await
}

async fn seed_roles(pool: &SqlitePool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for role in Role::ALL {
        sqlx::query(
            "INSERT INTO user_roles (id, name, description, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(role.as_str())
        .bind(role.description())
        .bind(now_ts())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Liveness probe.
pub async fn ping(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
