//! cipa-server library interface
//!
//! Exposes the router and application state for the binary and for
//! integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use cipa_common::config::ServiceConfig;
use cipa_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{ImageProxy, LogNotifier, Notifier, PollerRegistry, SignaturePoller, SignatureStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Resolved service settings
    pub config: Arc<ServiceConfig>,
    /// Signature artifacts on disk
    pub signatures: SignatureStore,
    /// Approval confirmation dispatch
    pub notifier: Arc<dyn Notifier>,
    /// Remote logo fetching
    pub images: ImageProxy,
    /// One status poller per candidate with an open hand-off
    pub pollers: PollerRegistry,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, config: ServiceConfig) -> cipa_common::Result<Self> {
        let images = ImageProxy::new().map_err(|e| cipa_common::Error::Internal(e.to_string()))?;
        Ok(Self {
            db,
            event_bus,
            signatures: SignatureStore::new(config.signatures_dir()),
            config: Arc::new(config),
            notifier: Arc::new(LogNotifier),
            images,
            pollers: PollerRegistry::new(),
            startup_time: Utc::now(),
        })
    }

    /// Replace the confirmation channel
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn poller(&self) -> SignaturePoller {
        SignaturePoller::new(self.config.poll_interval)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::branch_routes())
        .merge(api::term_routes())
        .merge(api::member_routes())
        .merge(api::meeting_routes())
        .merge(api::candidate_routes())
        .merge(api::signing_routes())
        .merge(api::signature_routes())
        .merge(api::calendar_routes())
        .merge(api::nr5_routes())
        .merge(api::certificate_routes())
        .merge(api::document_routes())
        .merge(api::proxy_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
