//! Lost & Found Server Binary
//!
//! Standalone server for the lost & found desk API.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lostfound_core::LostFoundConfig;
use lostfound_server::{serve, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match std::env::var("LOSTFOUND_CONFIG") {
        Ok(path) => LostFoundConfig::load(path)?,
        Err(_) => LostFoundConfig::load_standard()?,
    };
    if let Ok(db) = std::env::var("LOSTFOUND_DB") {
        config.storage.database_path = db.into();
    }
    if let Ok(addr) = std::env::var("LOSTFOUND_ADDR") {
        config.server.bind_address = addr;
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = Arc::new(AppState::open(&config)?);
    serve(&config.server.bind_address, state).await
}
