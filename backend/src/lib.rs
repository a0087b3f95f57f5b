//! Vet Clinic Management Platform - Backend
//!
//! Staff and client portal API for a veterinary clinic: owners, pets and
//! appointments, the product and supplier catalogue, and supplier purchases
//! that drive stock and cost.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod storage;

pub use config::Config;

use config::MirrorBackend;
use error::{AppError, AppResult};
use external::InvoiceApiClient;
use services::{
    DisabledInvoiceMirror, InvoiceMirror, MirrorOutbox, PgInvoiceMirror, PgProductStock,
    ProductStock, PurchaseStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub purchases: Arc<PurchaseStore>,
    pub outbox: Arc<MirrorOutbox>,
    pub mirror: Arc<dyn InvoiceMirror>,
    pub stock: Arc<dyn ProductStock>,
}

impl AppState {
    /// Wire up the stores and the configured invoice mirror
    pub fn new(db: PgPool, config: Config) -> AppResult<Self> {
        let purchases = PurchaseStore::new(&config.purchases.data_dir, &config.purchases.storage_key);
        let outbox = MirrorOutbox::new(&config.purchases.data_dir, &config.purchases.storage_key);
        let mirror = build_mirror(&config, db.clone())?;

        Ok(Self {
            stock: Arc::new(PgProductStock::new(db.clone())),
            db,
            config: Arc::new(config),
            purchases: Arc::new(purchases),
            outbox: Arc::new(outbox),
            mirror,
        })
    }
}

/// Pick the invoice mirror named by `mirror.backend`
pub fn build_mirror(config: &Config, db: PgPool) -> AppResult<Arc<dyn InvoiceMirror>> {
    let mirror: Arc<dyn InvoiceMirror> = match config.mirror.backend {
        MirrorBackend::Postgres => Arc::new(PgInvoiceMirror::new(db)),
        MirrorBackend::Rest => {
            let url = config.mirror.rest_url.clone().ok_or_else(|| {
                AppError::Configuration("mirror.rest_url is required for the rest backend".to_string())
            })?;
            Arc::new(InvoiceApiClient::new(
                url,
                config.mirror.api_key.clone(),
                Duration::from_secs(config.mirror.timeout_seconds),
            )?)
        }
        MirrorBackend::Disabled => Arc::new(DisabledInvoiceMirror),
    };

    tracing::info!(backend = mirror.backend_tag(), "Invoice mirror configured");
    Ok(mirror)
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Vet Clinic Management Platform API v1.0"
}

/// Liveness check
async fn health_check() -> &'static str {
    "OK"
}
