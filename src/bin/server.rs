use std::sync::Arc;

use sea_orm::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recipe_backend::server::config::ServerConfig;
use recipe_backend::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(ServerConfig::from_env()?);
    let db_pool = Database::connect(&config.database_url).await?;

    let app = web::create_router(db_pool, config.clone());
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "recipe API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
