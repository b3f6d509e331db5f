//! cinelog-web library interface
//!
//! Exposes the router and application state for the binary and for
//! integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{Catalog, MetadataSource, TitleExtractor};
use crate::workflow::BatchController;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Session database
    pub db: SqlitePool,
    /// Movie catalog behind its write lock
    pub catalog: Catalog,
    /// Titles from photos of movie cases
    pub extractor: Arc<dyn TitleExtractor>,
    /// Batch disambiguation driver
    pub controller: BatchController,
    /// Password checked at login
    pub site_password: Arc<str>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        catalog: Catalog,
        metadata: Arc<dyn MetadataSource>,
        extractor: Arc<dyn TitleExtractor>,
        site_password: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            db,
            catalog,
            controller: BatchController::new(metadata),
            extractor,
            site_password: site_password.into(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::auth_routes())
        .merge(api::catalog_routes())
        .merge(api::batch_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
