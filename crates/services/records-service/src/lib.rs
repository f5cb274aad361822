//! Records Service Library
//!
//! Paginated access to student records (students, grades, archives and
//! login records) over a remote store, served as an HTTP JSON API.

pub mod api;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::middleware::TokenVerifier;
use crate::api::{create_router, AppState};
use crate::config::RecordsServiceConfig;
use crate::infra::Database;
use crate::repository::memory_store;
use crate::service::Records;
use crate::store::{PgStore, RecordStore};

/// Which store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    /// Process-local tables, emptied on restart
    Memory,
}

/// Build the store client once for the whole process.
pub async fn connect_store(
    kind: StoreKind,
    config: &RecordsServiceConfig,
) -> Result<Arc<dyn RecordStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn RecordStore> = match kind {
        StoreKind::Postgres => {
            let db = Database::connect(&config.database).await?;
            Arc::new(PgStore::new(db))
        }
        StoreKind::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Arc::new(memory_store())
        }
    };
    Ok(store)
}

/// Run the HTTP server.
pub async fn run_server(kind: StoreKind, config: RecordsServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.jwt.secret.is_empty() {
        return Err("JWT_SECRET must be set to verify access tokens".into());
    }

    let store = connect_store(kind, &config).await?;
    let records = Arc::new(Records::new(store));
    let verifier = Arc::new(TokenVerifier::new(&config.jwt));

    let app = create_router(AppState::new(records, verifier));

    let addr: SocketAddr = config.service.addr().parse()?;
    info!("{} listening on {}", config.service.service_name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Ping the configured store and report the result.
pub async fn check_store(kind: StoreKind) -> Result<(), Box<dyn std::error::Error>> {
    let config = RecordsServiceConfig::from_env();
    let store = connect_store(kind, &config).await?;
    store.ping().await?;
    info!("Store is reachable");
    Ok(())
}
