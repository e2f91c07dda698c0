use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use pinka_api::{AppStateInner, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinka=debug,tower_http=debug".into()),
        )
        .init();

    // Config. The bot token doubles as the initData HMAC secret and the
    // bot-channel header secret, so there is no default for it.
    let bot_token = std::env::var("BOT_TOKEN").context("BOT_TOKEN is required")?;
    let db_path = std::env::var("PINKA_DB_PATH").unwrap_or_else(|_| "pinka.db".into());
    let host = std::env::var("PINKA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PINKA_PORT")
        .unwrap_or_else(|_| "10000".into())
        .parse()?;

    // Init database
    let db = pinka_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state = Arc::new(AppStateInner { db, bot_token });

    // The Mini-App runs in a browser webview, hence the permissive CORS.
    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Pinka server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
