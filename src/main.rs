use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use chem_inventory::config::{Config, DEFAULT_JWT_SECRET};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load().map_err(|e| format!("invalid configuration: {e}"))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        jwt_expires_in = %cfg.jwt_expires_in,
        open_registration = cfg.open_registration,
    );
    if cfg.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("CHEMINV_JWT_SECRET is not set; tokens are signed with the built-in default");
    }

    let pool = chem_inventory::db::connect(&cfg.database_url).await?;
    let state = chem_inventory::AppState::new(pool.clone(), &cfg)?;
    let app = chem_inventory::inventory_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    pool.close().await;
    Ok(())
}
